//! Derived pipeline types: TrendEstimate, Forecast, Signal, RankedSignalSet

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{EntityId, MetricName, Omission};

// ============================================================================
// Labels
// ============================================================================

/// Forecast confidence derived from slope dispersion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Named signal bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalClassification {
    MajorIncrease,
    ModerateIncrease,
    Stable,
    Pullback,
    MajorPullback,
    /// Dominant category changed between consecutive periods
    Pivot,
}

impl SignalClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MajorIncrease => "MAJOR_INCREASE",
            Self::ModerateIncrease => "MODERATE_INCREASE",
            Self::Stable => "STABLE",
            Self::Pullback => "PULLBACK",
            Self::MajorPullback => "MAJOR_PULLBACK",
            Self::Pivot => "PIVOT",
        }
    }
}

impl std::fmt::Display for SignalClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse calendar label for a forecast target week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeasonalContext {
    MajorPromotionalPeriod,
    HolidaySeason,
    PostHolidayReset,
    BackToSchool,
    Regular,
}

impl SeasonalContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MajorPromotionalPeriod => "MAJOR_PROMOTIONAL_PERIOD",
            Self::HolidaySeason => "HOLIDAY_SEASON",
            Self::PostHolidayReset => "POST_HOLIDAY_RESET",
            Self::BackToSchool => "BACK_TO_SCHOOL",
            Self::Regular => "REGULAR",
        }
    }

    /// Periods in which any significant change is escalated.
    pub fn is_peak(&self) -> bool {
        matches!(self, Self::MajorPromotionalPeriod | Self::HolidaySeason)
    }
}

impl std::fmt::Display for SeasonalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rule of the impact cascade that produced a signal's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactRule {
    HighConfidenceSurge,
    CriticalPivot,
    MediumMagnitude,
    PeakSeasonChange,
    CategoricalPivot,
    LowMagnitude,
    MinimalMagnitude,
    Baseline,
}

// ============================================================================
// Trend & Forecast
// ============================================================================

/// Trailing-window slope for one (entity, metric) as of a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendEstimate {
    pub entity_id: EntityId,
    pub metric: MetricName,
    pub as_of_period: NaiveDate,
    /// Change per period: (value[P] - value[P-W]) / W
    pub slope: f64,
    /// Sample standard deviation of the per-period deltas
    pub slope_stddev: f64,
    pub window_size: usize,
    /// Two-tailed p-value that the mean per-period delta is non-zero
    pub p_value: f64,
}

/// Projected value for one target period.
///
/// Invariant: `lower_bound <= point_value <= upper_bound`, all inside the
/// metric's domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub entity_id: EntityId,
    pub metric: MetricName,
    pub target_period: NaiveDate,
    pub point_value: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub confidence: ConfidenceLevel,
}

// ============================================================================
// Signals
// ============================================================================

/// Dominant-category change behind a PIVOT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryShift {
    pub from: String,
    pub to: String,
}

/// A classified, scored change in one metric for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub entity_id: EntityId,
    pub metric: MetricName,
    pub target_period: NaiveDate,
    pub classification: SignalClassification,
    /// Normalized non-negative size of the change (absolute or relative basis)
    pub change_magnitude: f64,
    /// Forecast minus current, in native units
    pub signed_change: f64,
    /// `None` for categorical metrics
    pub current_value: Option<f64>,
    /// `None` for categorical pivots
    pub forecast: Option<Forecast>,
    pub confidence: ConfidenceLevel,
    /// Trend significance, `None` for categorical pivots
    pub trend_p_value: Option<f64>,
    pub category_shift: Option<CategoryShift>,
    /// 1 (lowest) ..= 5 (highest)
    pub business_impact: u8,
    pub impact_rule: ImpactRule,
    /// Set when cross-entity outlier status raised the impact score
    pub outlier_boosted: bool,
    pub seasonal_context: SeasonalContext,
    pub uniqueness_score: f64,
    pub passed_noise_filter: bool,
}

/// Top signals for one entity from one ranking pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSignalSet {
    pub entity_id: EntityId,
    /// The as-of period the ranking was computed for
    pub period: NaiveDate,
    /// Sorted by (impact desc, magnitude desc, uniqueness desc, metric ordinal)
    pub signals: Vec<Signal>,
    /// Metrics excluded for insufficient or missing data
    pub omissions: Vec<Omission>,
    /// Signals dropped by the noise threshold filter
    pub suppressed_by_noise_filter: usize,
}

impl RankedSignalSet {
    pub fn empty(entity_id: impl Into<EntityId>, period: NaiveDate) -> Self {
        Self {
            entity_id: entity_id.into(),
            period,
            signals: Vec::new(),
            omissions: Vec::new(),
            suppressed_by_noise_filter: 0,
        }
    }
}
