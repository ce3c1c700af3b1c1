//! Engine Configuration - every signal threshold as an analyst-tunable TOML value
//!
//! Each struct implements `Default` with the values in `defaults.rs` (or the
//! per-family calibration below), so a run without a config file behaves
//! exactly like a run with an empty one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::types::MetricFamily;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "ADSCOPE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "adscope.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a signal engine deployment.
///
/// Load with `EngineConfig::load()` which searches:
/// 1. `$ADSCOPE_CONFIG` env var
/// 2. `./adscope.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Trailing-window trend estimation
    #[serde(default)]
    pub trend: TrendConfig,

    /// Forecast horizon and uncertainty calibration
    #[serde(default)]
    pub forecast: ForecastConfig,

    /// Top-K selection and cross-entity outlier handling
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Per-metric-family thresholds
    #[serde(default)]
    pub families: FamilyConfigs,

    /// External narrative collaborator
    #[serde(default)]
    pub narrative: NarrativeConfig,
}

impl EngineConfig {
    /// Load configuration using the standard search order:
    /// 1. `$ADSCOPE_CONFIG` environment variable
    /// 2. `./adscope.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded engine config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded engine config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    ///
    /// Unknown keys are logged as warnings (with a suggestion when one is
    /// close); they never fail the load.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Engine config saved");
        Ok(())
    }

    /// Thresholds for a metric family.
    pub fn family(&self, family: MetricFamily) -> &FamilyThresholds {
        match family {
            MetricFamily::CoreStrategic => &self.families.core_strategic,
            MetricFamily::CtaDerived => &self.families.cta_derived,
            MetricFamily::MediaMix => &self.families.media_mix,
            MetricFamily::Volume => &self.families.volume,
        }
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Window in 2..=MAX_TRAILING_WINDOW (a stddev of deltas needs two
    ///   deltas), horizon in 1..=MAX_FORECAST_HORIZON, top-K >= 1
    /// - Uncertainty multipliers positive
    /// - Per family: major >= moderate > 0, high_below < medium_below,
    ///   impact thresholds non-increasing from high to minimal, and
    ///   impact.medium above the noise floor
    /// - Every float finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if !(2..=defaults::MAX_TRAILING_WINDOW).contains(&self.trend.window_size) {
            errors.push(format!(
                "trend.window_size must be in 2..={}, got {}",
                defaults::MAX_TRAILING_WINDOW,
                self.trend.window_size
            ));
        }
        if self.forecast.horizon == 0 {
            errors.push("forecast.horizon must be > 0".to_string());
        } else if self.forecast.horizon > defaults::MAX_FORECAST_HORIZON {
            errors.push(format!(
                "forecast.horizon must be <= {}, got {}",
                defaults::MAX_FORECAST_HORIZON,
                self.forecast.horizon
            ));
        }
        if self.ranking.top_k == 0 {
            errors.push("ranking.top_k must be > 0".to_string());
        }

        Self::check_positive(
            self.forecast.uncertainty_multiplier,
            "forecast.uncertainty_multiplier",
            &mut errors,
        );
        Self::check_positive(
            self.forecast.volatile_uncertainty_multiplier,
            "forecast.volatile_uncertainty_multiplier",
            &mut errors,
        );
        if !self.ranking.outlier_uniqueness_threshold.is_finite()
            || self.ranking.outlier_uniqueness_threshold < 0.0
        {
            errors.push(format!(
                "ranking.outlier_uniqueness_threshold must be a finite value >= 0, got {}",
                self.ranking.outlier_uniqueness_threshold
            ));
        }

        for family in MetricFamily::ALL {
            self.family(family)
                .validate(&format!("families.{}", family.as_str()), &mut errors);
        }

        if self.narrative.timeout_secs == 0 {
            errors.push("narrative.timeout_secs must be > 0".to_string());
        }
        if self.narrative.max_concurrency == 0 {
            errors.push("narrative.max_concurrency must be > 0".to_string());
        }
        if self.narrative.max_attempts == 0 {
            errors.push("narrative.max_attempts must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value <= 0.0 {
            errors.push(format!("{name} must be a finite value > 0, got {value}"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Trend / Forecast / Ranking
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Trailing window W in periods
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

fn default_window_size() -> usize {
    defaults::TRAILING_WINDOW
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Horizon H in periods
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    /// K for regular metrics
    #[serde(default = "default_uncertainty_multiplier")]
    pub uncertainty_multiplier: f64,

    /// K for volatile metrics
    #[serde(default = "default_volatile_uncertainty_multiplier")]
    pub volatile_uncertainty_multiplier: f64,
}

fn default_horizon() -> usize {
    defaults::FORECAST_HORIZON
}
fn default_uncertainty_multiplier() -> f64 {
    defaults::UNCERTAINTY_MULTIPLIER
}
fn default_volatile_uncertainty_multiplier() -> f64 {
    defaults::VOLATILE_UNCERTAINTY_MULTIPLIER
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            uncertainty_multiplier: default_uncertainty_multiplier(),
            volatile_uncertainty_multiplier: default_volatile_uncertainty_multiplier(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Signals kept per entity
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Uniqueness at which an entity counts as an outlier for a metric
    #[serde(default = "default_outlier_threshold")]
    pub outlier_uniqueness_threshold: f64,

    /// Raise impact 2/3 by one point for outlier metrics
    #[serde(default = "default_true")]
    pub outlier_boost: bool,
}

fn default_top_k() -> usize {
    defaults::TOP_K
}
fn default_outlier_threshold() -> f64 {
    defaults::OUTLIER_UNIQUENESS_THRESHOLD
}
fn default_true() -> bool {
    true
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            outlier_uniqueness_threshold: default_outlier_threshold(),
            outlier_boost: true,
        }
    }
}

// ============================================================================
// Per-Family Thresholds
// ============================================================================

/// Thresholds for every metric family.
///
/// A family table present in the TOML file replaces that family's
/// calibration as a whole, so it must specify every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyConfigs {
    pub core_strategic: FamilyThresholds,
    pub cta_derived: FamilyThresholds,
    pub media_mix: FamilyThresholds,
    pub volume: FamilyThresholds,
}

impl Default for FamilyConfigs {
    fn default() -> Self {
        Self {
            core_strategic: FamilyThresholds::core_strategic(),
            cta_derived: FamilyThresholds::cta_derived(),
            media_mix: FamilyThresholds::media_mix(),
            volume: FamilyThresholds::volume(),
        }
    }
}

/// Calibration for one metric family. Magnitudes are in the family's change
/// basis (absolute for ratios, relative for counts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyThresholds {
    /// Minimum change magnitude a signal needs to survive the noise filter
    pub noise_floor: f64,
    pub classification: ClassificationThresholds,
    pub confidence: ConfidenceCutPoints,
    pub impact: ImpactThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationThresholds {
    /// |change| at or above this is MAJOR_INCREASE / MAJOR_PULLBACK
    pub major: f64,
    /// |change| at or above this is MODERATE_INCREASE / PULLBACK
    pub moderate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceCutPoints {
    /// Slope stddev strictly below this is HIGH
    pub high_below: f64,
    /// Slope stddev strictly below this is MEDIUM, otherwise LOW
    pub medium_below: f64,
}

impl Default for ConfidenceCutPoints {
    fn default() -> Self {
        Self {
            high_below: defaults::CONFIDENCE_HIGH_BELOW,
            medium_below: defaults::CONFIDENCE_MEDIUM_BELOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactThresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
    pub minimal: f64,
}

impl FamilyThresholds {
    pub fn core_strategic() -> Self {
        Self {
            noise_floor: 0.10,
            classification: ClassificationThresholds {
                major: 0.15,
                moderate: 0.08,
            },
            confidence: ConfidenceCutPoints::default(),
            impact: ImpactThresholds {
                high: 0.15,
                medium: 0.12,
                low: 0.05,
                minimal: 0.02,
            },
        }
    }

    pub fn cta_derived() -> Self {
        Self {
            noise_floor: 0.12,
            classification: ClassificationThresholds {
                major: 0.15,
                moderate: 0.10,
            },
            confidence: ConfidenceCutPoints {
                high_below: 0.025,
                medium_below: 0.05,
            },
            impact: ImpactThresholds {
                high: 0.18,
                medium: 0.15,
                low: 0.06,
                minimal: 0.03,
            },
        }
    }

    pub fn media_mix() -> Self {
        Self {
            noise_floor: 0.20,
            classification: ClassificationThresholds {
                major: 0.20,
                moderate: 0.10,
            },
            confidence: ConfidenceCutPoints {
                high_below: 0.04,
                medium_below: 0.08,
            },
            impact: ImpactThresholds {
                high: 0.30,
                medium: 0.25,
                low: 0.10,
                minimal: 0.05,
            },
        }
    }

    pub fn volume() -> Self {
        Self {
            noise_floor: 0.20,
            classification: ClassificationThresholds {
                major: 0.20,
                moderate: 0.10,
            },
            confidence: ConfidenceCutPoints {
                high_below: 0.05,
                medium_below: 0.10,
            },
            impact: ImpactThresholds {
                high: 0.40,
                medium: 0.25,
                low: 0.12,
                minimal: 0.05,
            },
        }
    }

    fn validate(&self, prefix: &str, errors: &mut Vec<String>) {
        let values = [
            ("noise_floor", self.noise_floor),
            ("classification.major", self.classification.major),
            ("classification.moderate", self.classification.moderate),
            ("confidence.high_below", self.confidence.high_below),
            ("confidence.medium_below", self.confidence.medium_below),
            ("impact.high", self.impact.high),
            ("impact.medium", self.impact.medium),
            ("impact.low", self.impact.low),
            ("impact.minimal", self.impact.minimal),
        ];
        let mut all_finite = true;
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!(
                    "{prefix}.{name} must be a finite value >= 0, got {value}"
                ));
                all_finite = false;
            }
        }
        // Ordering checks are meaningless on NaN/Inf
        if !all_finite {
            return;
        }

        let c = &self.classification;
        if c.moderate <= 0.0 {
            errors.push(format!("{prefix}.classification.moderate must be > 0"));
        }
        if c.major < c.moderate {
            errors.push(format!(
                "{prefix}.classification.major ({:.3}) must be >= moderate ({:.3})",
                c.major, c.moderate
            ));
        }

        let k = &self.confidence;
        if k.high_below >= k.medium_below {
            errors.push(format!(
                "{prefix}.confidence.high_below ({:.3}) must be < medium_below ({:.3})",
                k.high_below, k.medium_below
            ));
        }

        let i = &self.impact;
        if !(i.high >= i.medium && i.medium >= i.low && i.low >= i.minimal) {
            errors.push(format!(
                "{prefix}.impact thresholds must satisfy high >= medium >= low >= minimal \
                 (got {:.3} / {:.3} / {:.3} / {:.3})",
                i.high, i.medium, i.low, i.minimal
            ));
        }
        // Otherwise the peak-season rule and the outlier boost never fire
        if i.medium <= self.noise_floor {
            errors.push(format!(
                "{prefix}.impact.medium ({:.3}) must be > noise_floor ({:.3})",
                i.medium, self.noise_floor
            ));
        }
    }
}

// ============================================================================
// Narrative Collaborator
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeConfig {
    /// HTTP endpoint accepting narrative requests; `None` disables dispatch
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Per-request timeout (seconds)
    #[serde(default = "default_narrative_timeout")]
    pub timeout_secs: u64,

    /// Concurrent in-flight requests
    #[serde(default = "default_narrative_concurrency")]
    pub max_concurrency: usize,

    /// Attempts per request
    #[serde(default = "default_narrative_attempts")]
    pub max_attempts: u32,

    /// Base retry backoff (milliseconds)
    #[serde(default = "default_narrative_backoff")]
    pub retry_backoff_ms: u64,
}

fn default_narrative_timeout() -> u64 {
    defaults::NARRATIVE_TIMEOUT_SECS
}
fn default_narrative_concurrency() -> usize {
    defaults::NARRATIVE_MAX_CONCURRENCY
}
fn default_narrative_attempts() -> u32 {
    defaults::NARRATIVE_MAX_ATTEMPTS
}
fn default_narrative_backoff() -> u64 {
    defaults::NARRATIVE_RETRY_BACKOFF_MS
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_narrative_timeout(),
            max_concurrency: default_narrative_concurrency(),
            max_attempts: default_narrative_attempts(),
            retry_backoff_ms: default_narrative_backoff(),
        }
    }
}
