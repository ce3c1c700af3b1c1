//! Change measurement and signal bucketing

use crate::config::ClassificationThresholds;
use crate::types::{ChangeBasis, MetricName, SignalClassification};

/// Size of a projected change, in the metric's change basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeMeasure {
    /// Non-negative, comparable against family thresholds
    pub magnitude: f64,
    /// Normalized like `magnitude` but keeping the sign
    pub normalized: f64,
    /// `point - current` in native units
    pub raw: f64,
}

pub struct SignalClassifier;

impl SignalClassifier {
    /// Measure the change from `current` to the forecast `point`.
    ///
    /// Ratio metrics use the absolute difference; count metrics divide it
    /// by `max(|current|, 1)`.
    pub fn measure(metric: MetricName, current: f64, point: f64) -> ChangeMeasure {
        let raw = point - current;
        let normalized = match metric.change_basis() {
            ChangeBasis::Absolute => raw,
            ChangeBasis::Relative => raw / current.abs().max(1.0),
        };
        ChangeMeasure {
            magnitude: normalized.abs(),
            normalized,
            raw,
        }
    }

    /// Bucket a signed, normalized change.
    pub fn classify_change(change: f64, thresholds: &ClassificationThresholds) -> SignalClassification {
        if change >= thresholds.major {
            SignalClassification::MajorIncrease
        } else if change >= thresholds.moderate {
            SignalClassification::ModerateIncrease
        } else if change <= -thresholds.major {
            SignalClassification::MajorPullback
        } else if change <= -thresholds.moderate {
            SignalClassification::Pullback
        } else {
            SignalClassification::Stable
        }
    }

    /// PIVOT whenever the dominant category changed, STABLE otherwise.
    ///
    /// Labels compare trimmed and case-insensitively.
    pub fn classify_categories(prior: &str, current: &str) -> SignalClassification {
        if prior.trim().eq_ignore_ascii_case(current.trim()) {
            SignalClassification::Stable
        } else {
            SignalClassification::Pivot
        }
    }
}
