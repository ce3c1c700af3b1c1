//! Narrative request payloads built from ranked signals

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::types::{
    CategoryShift, ConfidenceLevel, EntityId, MetricName, RankedSignalSet, SeasonalContext, Signal,
    SignalClassification,
};

/// What the narrative collaborator needs to describe one signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeRequest {
    pub entity_id: EntityId,
    pub metric: MetricName,
    pub target_period: NaiveDate,
    pub classification: SignalClassification,
    pub current_value: Option<f64>,
    pub forecast_value: Option<f64>,
    pub change_magnitude: f64,
    pub confidence: ConfidenceLevel,
    pub seasonal_context: SeasonalContext,
    pub business_impact: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_shift: Option<CategoryShift>,
}

impl NarrativeRequest {
    pub fn from_signal(signal: &Signal) -> Self {
        Self {
            entity_id: signal.entity_id.clone(),
            metric: signal.metric,
            target_period: signal.target_period,
            classification: signal.classification,
            current_value: signal.current_value,
            forecast_value: signal.forecast.as_ref().map(|f| f.point_value),
            change_magnitude: signal.change_magnitude,
            confidence: signal.confidence,
            seasonal_context: signal.seasonal_context,
            business_impact: signal.business_impact,
            category_shift: signal.category_shift.clone(),
        }
    }

    /// One request per ranked signal, in entity then rank order.
    pub fn from_ranked(sets: &BTreeMap<EntityId, RankedSignalSet>) -> Vec<Self> {
        sets.values()
            .flat_map(|set| set.signals.iter().map(Self::from_signal))
            .collect()
    }

    /// Plain-text instruction for text-generation backends.
    pub fn prompt(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Write a two-sentence briefing on a competitor's advertising strategy."
        );
        let _ = writeln!(out, "Competitor: {}", self.entity_id);
        let _ = writeln!(out, "Metric: {}", self.metric);
        let _ = writeln!(out, "Signal: {} for week of {}", self.classification, self.target_period);

        match &self.category_shift {
            Some(shift) => {
                let _ = writeln!(out, "Dominant category changed: {} -> {}", shift.from, shift.to);
            }
            None => {
                if let Some(current) = self.current_value {
                    let _ = writeln!(out, "Current value: {current:.3}");
                }
                if let Some(forecast) = self.forecast_value {
                    let _ = writeln!(out, "Forecast value: {forecast:.3}");
                }
                let _ = writeln!(out, "Change magnitude: {:.3}", self.change_magnitude);
            }
        }

        let _ = writeln!(out, "Confidence: {}", self.confidence);
        let _ = writeln!(out, "Seasonal context: {}", self.seasonal_context);
        let _ = write!(out, "Business impact: {}/5", self.business_impact);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Forecast, ImpactRule};

    fn signal() -> Signal {
        let target = NaiveDate::from_ymd_opt(2024, 11, 25).unwrap();
        Signal {
            entity_id: "acme".to_string(),
            metric: MetricName::PromotionalIntensity,
            target_period: target,
            classification: SignalClassification::MajorIncrease,
            change_magnitude: 0.2,
            signed_change: 0.2,
            current_value: Some(0.4),
            forecast: Some(Forecast {
                entity_id: "acme".to_string(),
                metric: MetricName::PromotionalIntensity,
                target_period: target,
                point_value: 0.6,
                lower_bound: 0.55,
                upper_bound: 0.65,
                confidence: ConfidenceLevel::High,
            }),
            confidence: ConfidenceLevel::High,
            trend_p_value: Some(0.01),
            category_shift: None,
            business_impact: 5,
            impact_rule: ImpactRule::HighConfidenceSurge,
            outlier_boosted: false,
            seasonal_context: SeasonalContext::MajorPromotionalPeriod,
            uniqueness_score: 0.2,
            passed_noise_filter: true,
        }
    }

    #[test]
    fn request_carries_forecast_point() {
        let req = NarrativeRequest::from_signal(&signal());
        assert_eq!(req.forecast_value, Some(0.6));
        assert_eq!(req.business_impact, 5);

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["metric"], "promotional_intensity");
        assert_eq!(json["seasonal_context"], "MAJOR_PROMOTIONAL_PERIOD");
        assert!(json.get("category_shift").is_none());
    }

    #[test]
    fn prompt_mentions_the_facts() {
        let prompt = NarrativeRequest::from_signal(&signal()).prompt();
        assert!(prompt.contains("Competitor: acme"));
        assert!(prompt.contains("Forecast value: 0.600"));
        assert!(prompt.contains("MAJOR_PROMOTIONAL_PERIOD"));
        assert!(prompt.ends_with("Business impact: 5/5"));
    }

    #[test]
    fn pivot_prompt_describes_the_shift() {
        let mut s = signal();
        s.metric = MetricName::DominantMessageAngle;
        s.classification = SignalClassification::Pivot;
        s.forecast = None;
        s.current_value = None;
        s.category_shift = Some(CategoryShift {
            from: "lifestyle".to_string(),
            to: "price".to_string(),
        });
        let prompt = NarrativeRequest::from_signal(&s).prompt();
        assert!(prompt.contains("lifestyle -> price"));
        assert!(!prompt.contains("Forecast value"));
    }
}
