//! Signal Engine
//!
//! Turns weekly metric history into ranked, scored signals per entity.
//!
//! ## Stages
//!
//! | Stage        | Module        | Output                                  |
//! |--------------|---------------|-----------------------------------------|
//! | Trend        | `trend`       | slope, slope stddev, p-value            |
//! | Confidence   | `confidence`  | HIGH / MEDIUM / LOW                     |
//! | Forecast     | `forecast`    | clamped point and bounds at H weeks     |
//! | Classify     | `classify`    | change magnitude and bucket, or PIVOT   |
//! | Season       | `seasonal`    | calendar context of the target week     |
//! | Impact       | `impact`      | 1-5 score from the rule cascade         |
//! | Noise        | `noise`       | drop sub-floor signals below impact 4   |
//! | Uniqueness   | `uniqueness`  | distance from the cross-entity field    |
//! | Top-K        | `ranking`     | sorted, truncated signal list           |
//!
//! The core performs no I/O; everything it reads comes from the
//! [`MetricSeriesStore`](crate::store::MetricSeriesStore) snapshot passed in.

pub mod classify;
pub mod confidence;
pub mod forecast;
pub mod impact;
pub mod noise;
pub mod ranking;
pub mod seasonal;
pub mod trend;
pub mod uniqueness;
mod signal_engine;

pub use classify::{ChangeMeasure, SignalClassifier};
pub use confidence::ConfidenceClassifier;
pub use forecast::Forecaster;
pub use impact::{BusinessImpactScorer, ImpactInput};
pub use noise::NoiseThresholdFilter;
pub use ranking::TopKSignalSelector;
pub use seasonal::SeasonalContextTagger;
pub use signal_engine::SignalEngine;
pub use trend::TrendEstimator;
pub use uniqueness::UniquenessIndex;
