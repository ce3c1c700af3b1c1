//! System-wide default constants.
//!
//! Every tunable the engine reads has its default here; `EngineConfig`
//! falls back to these when a key is absent from the TOML file.

// ============================================================================
// Trend & Forecast
// ============================================================================

/// Trailing window W (periods) for slope estimation.
pub const TRAILING_WINDOW: usize = 4;

/// Forecast horizon H (periods ahead).
pub const FORECAST_HORIZON: usize = 4;

/// Largest accepted trailing window (two years of weeks).
pub const MAX_TRAILING_WINDOW: usize = 104;

/// Largest accepted forecast horizon (two years of weeks).
pub const MAX_FORECAST_HORIZON: usize = 104;

/// Uncertainty multiplier K for regular metrics.
pub const UNCERTAINTY_MULTIPLIER: f64 = 1.2;

/// Uncertainty multiplier K for volatile metrics (media-mix ratios, volume counts).
pub const VOLATILE_UNCERTAINTY_MULTIPLIER: f64 = 1.5;

// ============================================================================
// Confidence (used when a family has no calibration of its own)
// ============================================================================

/// Slope stddev below this is HIGH confidence.
pub const CONFIDENCE_HIGH_BELOW: f64 = 0.02;

/// Slope stddev below this (and not HIGH) is MEDIUM confidence.
pub const CONFIDENCE_MEDIUM_BELOW: f64 = 0.04;

// ============================================================================
// Ranking
// ============================================================================

/// Signals kept per entity.
pub const TOP_K: usize = 5;

/// Uniqueness at or above which an entity counts as a cross-entity outlier.
pub const OUTLIER_UNIQUENESS_THRESHOLD: f64 = 0.15;

// ============================================================================
// Narrative dispatch
// ============================================================================

/// Per-request timeout for the narrative collaborator (seconds).
pub const NARRATIVE_TIMEOUT_SECS: u64 = 30;

/// Concurrent in-flight narrative requests.
pub const NARRATIVE_MAX_CONCURRENCY: usize = 4;

/// Attempts per narrative request (1 = no retry).
pub const NARRATIVE_MAX_ATTEMPTS: u32 = 3;

/// Base backoff between narrative retries (milliseconds), doubled per attempt.
pub const NARRATIVE_RETRY_BACKOFF_MS: u64 = 500;
