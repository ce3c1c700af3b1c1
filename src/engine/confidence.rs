//! Forecast confidence from slope dispersion

use crate::config::ConfidenceCutPoints;
use crate::types::{ChangeBasis, ConfidenceLevel, MetricName};

/// Maps slope standard deviation onto HIGH / MEDIUM / LOW.
pub struct ConfidenceClassifier;

impl ConfidenceClassifier {
    /// Classify a trend's dispersion against its family's cut points.
    ///
    /// Count metrics compare dispersion relative to `max(current, 1)` so a
    /// family's cut points apply across entities of very different size.
    pub fn classify(
        metric: MetricName,
        slope_stddev: f64,
        current: f64,
        cut_points: &ConfidenceCutPoints,
    ) -> ConfidenceLevel {
        let dispersion = match metric.change_basis() {
            ChangeBasis::Absolute => slope_stddev,
            ChangeBasis::Relative => slope_stddev / current.abs().max(1.0),
        };

        if dispersion < cut_points.high_below {
            ConfidenceLevel::High
        } else if dispersion < cut_points.medium_below {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}
