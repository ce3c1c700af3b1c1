//! Shared data structures for the competitive signal pipeline
//!
//! - Metric taxonomy: MetricName, MetricFamily, Domain
//! - Ingestion: MetricSample, SampleValue, weekly period arithmetic
//! - Pipeline outputs: TrendEstimate, Forecast, Signal, RankedSignalSet
//! - Errors: SignalError, Omission

mod metric;
mod sample;
mod signal;
mod errors;

pub use metric::*;
pub use sample::*;
pub use signal::*;
pub use errors::*;
