//! adscope: Competitive Ad Strategy Signals
//!
//! Forecasts short-term changes in competitors' advertising strategy from
//! weekly metric history and ranks them by business relevance.
//!
//! ## Architecture
//!
//! - **Store**: validated weekly samples per (entity, metric, period)
//! - **Engine**: trend, forecast, classification, impact, noise, uniqueness, top-K
//! - **Narrative**: request payloads and async dispatch to a text-generation service
//! - **Config**: one TOML surface for every threshold

pub mod config;
pub mod engine;
pub mod narrative;
pub mod store;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, EngineConfig};

// Re-export commonly used types
pub use types::{
    ConfidenceLevel, EntityId, Forecast, MetricFamily, MetricName, MetricSample, Omission,
    OmissionKind, RankedSignalSet, SampleValue, SeasonalContext, Signal, SignalClassification,
    SignalError, TrendEstimate,
};

// Re-export the engine entry point
pub use engine::SignalEngine;

// Re-export storage
pub use store::{IngestReport, MetricSeriesStore, StoreError};

// Re-export narrative components
pub use narrative::{
    HttpNarrativeBackend, NarrativeBackend, NarrativeDispatcher, NarrativeError, NarrativeOutcome,
    NarrativeRequest,
};
