//! Business impact scoring
//!
//! An ordered table of rules; the first rule that matches a signal decides
//! its 1-5 score. Each rule is a variant of [`ImpactRule`] so it can be
//! checked in isolation and reported on the signal that it scored.
//!
//! | Rule                  | Score | Condition                                      |
//! |-----------------------|-------|------------------------------------------------|
//! | HighConfidenceSurge   | 5     | magnitude >= high and confidence HIGH          |
//! | CriticalPivot         | 5     | pivot on a strategically critical metric       |
//! | MediumMagnitude       | 4     | magnitude >= medium                            |
//! | PeakSeasonChange      | 4     | significant change in a peak season            |
//! | CategoricalPivot      | 4     | pivot on any other categorical metric          |
//! | LowMagnitude          | 3     | magnitude >= low                               |
//! | MinimalMagnitude      | 2     | magnitude >= minimal                           |
//! | Baseline              | 1     | always                                         |

use crate::config::FamilyThresholds;
use crate::types::{
    ConfidenceLevel, ImpactRule, MetricName, SeasonalContext, Signal, SignalClassification,
};

/// The facts a rule looks at.
#[derive(Debug, Clone, Copy)]
pub struct ImpactInput {
    pub metric: MetricName,
    pub magnitude: f64,
    pub confidence: ConfidenceLevel,
    pub classification: SignalClassification,
    pub seasonal_context: SeasonalContext,
}

impl ImpactInput {
    pub fn from_signal(signal: &Signal) -> Self {
        Self {
            metric: signal.metric,
            magnitude: signal.change_magnitude,
            confidence: signal.confidence,
            classification: signal.classification,
            seasonal_context: signal.seasonal_context,
        }
    }

    fn is_pivot(&self) -> bool {
        self.classification == SignalClassification::Pivot
    }
}

impl ImpactRule {
    /// Evaluation order of the cascade.
    pub const CASCADE: [ImpactRule; 8] = [
        ImpactRule::HighConfidenceSurge,
        ImpactRule::CriticalPivot,
        ImpactRule::MediumMagnitude,
        ImpactRule::PeakSeasonChange,
        ImpactRule::CategoricalPivot,
        ImpactRule::LowMagnitude,
        ImpactRule::MinimalMagnitude,
        ImpactRule::Baseline,
    ];

    pub fn score(&self) -> u8 {
        match self {
            Self::HighConfidenceSurge | Self::CriticalPivot => 5,
            Self::MediumMagnitude | Self::PeakSeasonChange | Self::CategoricalPivot => 4,
            Self::LowMagnitude => 3,
            Self::MinimalMagnitude => 2,
            Self::Baseline => 1,
        }
    }

    pub fn matches(&self, input: &ImpactInput, thresholds: &FamilyThresholds) -> bool {
        let t = &thresholds.impact;
        let m = input.magnitude;
        match self {
            Self::HighConfidenceSurge => m >= t.high && input.confidence == ConfidenceLevel::High,
            Self::CriticalPivot => input.is_pivot() && input.metric.is_strategically_critical(),
            Self::MediumMagnitude => m >= t.medium,
            Self::PeakSeasonChange => {
                m >= thresholds.noise_floor && input.seasonal_context.is_peak()
            }
            Self::CategoricalPivot => input.is_pivot(),
            Self::LowMagnitude => m >= t.low,
            Self::MinimalMagnitude => m >= t.minimal,
            Self::Baseline => true,
        }
    }
}

pub struct BusinessImpactScorer;

impl BusinessImpactScorer {
    /// Score with the first matching rule of the cascade.
    pub fn score(input: &ImpactInput, thresholds: &FamilyThresholds) -> (u8, ImpactRule) {
        let rule = ImpactRule::CASCADE
            .into_iter()
            .find(|rule| rule.matches(input, thresholds))
            .unwrap_or(ImpactRule::Baseline);
        (rule.score(), rule)
    }

    /// Raise an impact of 2 or 3 by one point when the entity is an outlier.
    ///
    /// Returns whether the signal was boosted.
    pub fn apply_outlier_boost(signal: &mut Signal, threshold: f64) -> bool {
        if signal.uniqueness_score >= threshold && matches!(signal.business_impact, 2 | 3) {
            signal.business_impact += 1;
            signal.outlier_boosted = true;
            return true;
        }
        false
    }
}
