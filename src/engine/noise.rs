//! Noise threshold filtering

use crate::config::EngineConfig;
use crate::types::Signal;

/// Impact at or above which a signal survives regardless of magnitude.
pub const ALWAYS_RETAIN_IMPACT: u8 = 4;

pub struct NoiseThresholdFilter;

impl NoiseThresholdFilter {
    pub fn passes(signal: &Signal, noise_floor: f64) -> bool {
        signal.business_impact >= ALWAYS_RETAIN_IMPACT || signal.change_magnitude >= noise_floor
    }

    /// Keep the signals that clear their family's noise floor.
    ///
    /// Kept signals are marked `passed_noise_filter`; the count of dropped
    /// signals is returned alongside.
    pub fn apply(signals: Vec<Signal>, config: &EngineConfig) -> (Vec<Signal>, usize) {
        let total = signals.len();
        let kept: Vec<Signal> = signals
            .into_iter()
            .filter(|s| Self::passes(s, config.family(s.metric.family()).noise_floor))
            .map(|mut s| {
                s.passed_noise_filter = true;
                s
            })
            .collect();
        let suppressed = total - kept.len();
        (kept, suppressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ConfidenceLevel, ImpactRule, MetricName, SeasonalContext, SignalClassification,
    };
    use chrono::NaiveDate;

    fn signal(metric: MetricName, magnitude: f64, impact: u8) -> Signal {
        Signal {
            entity_id: "acme".to_string(),
            metric,
            target_period: NaiveDate::from_ymd_opt(2024, 10, 21).unwrap(),
            classification: SignalClassification::ModerateIncrease,
            change_magnitude: magnitude,
            signed_change: magnitude,
            current_value: Some(0.5),
            forecast: None,
            confidence: ConfidenceLevel::Medium,
            trend_p_value: None,
            category_shift: None,
            business_impact: impact,
            impact_rule: ImpactRule::Baseline,
            outlier_boosted: false,
            seasonal_context: SeasonalContext::Regular,
            uniqueness_score: 0.0,
            passed_noise_filter: false,
        }
    }

    #[test]
    fn magnitude_below_floor_dropped() {
        let config = EngineConfig::default();
        let (kept, suppressed) = NoiseThresholdFilter::apply(
            vec![
                signal(MetricName::UrgencyLevel, 0.12, 3),
                signal(MetricName::UrgencyLevel, 0.05, 3),
                signal(MetricName::VideoShare, 0.12, 3),
            ],
            &config,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(suppressed, 2);
        assert!(kept[0].passed_noise_filter);
    }

    #[test]
    fn high_impact_never_filtered() {
        let config = EngineConfig::default();
        let (kept, suppressed) = NoiseThresholdFilter::apply(
            vec![
                signal(MetricName::DominantMessageAngle, 0.0, 5),
                signal(MetricName::DominantCtaType, 0.0, 4),
            ],
            &config,
        );
        assert_eq!(kept.len(), 2);
        assert_eq!(suppressed, 0);
    }
}
