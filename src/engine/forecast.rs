//! Linear forecast projection with domain clamping

use crate::config::ForecastConfig;
use crate::types::{horizon_period, ConfidenceLevel, Forecast, SignalError, TrendEstimate};

/// Projects a trend H periods forward.
///
/// `point = current + slope * H`, `uncertainty = slope_stddev * sqrt(H) * K`
/// where K is the regular or volatile multiplier depending on the metric.
/// Point and both bounds are clamped into the metric's domain; a count whose
/// projection overflows saturates at `f64::MAX`.
#[derive(Debug, Clone)]
pub struct Forecaster {
    uncertainty_multiplier: f64,
    volatile_uncertainty_multiplier: f64,
}

impl Forecaster {
    pub fn new(config: &ForecastConfig) -> Self {
        Self {
            uncertainty_multiplier: config.uncertainty_multiplier,
            volatile_uncertainty_multiplier: config.volatile_uncertainty_multiplier,
        }
    }

    /// Forecast the value `horizon` periods after the trend's as-of period.
    ///
    /// `current` is the metric value at the as-of period; `None` yields
    /// `MissingCurrentValue` rather than a forecast from zero. A horizon that
    /// leaves the calendar yields `InvalidRequest`.
    pub fn forecast(
        &self,
        trend: &TrendEstimate,
        current: Option<f64>,
        horizon: usize,
        confidence: ConfidenceLevel,
    ) -> Result<Forecast, SignalError> {
        let current = current.ok_or_else(|| SignalError::MissingCurrentValue {
            entity_id: trend.entity_id.clone(),
            metric: trend.metric,
            period: trend.as_of_period,
        })?;
        let domain = trend.metric.domain().ok_or_else(|| SignalError::ValueKindMismatch {
            entity_id: trend.entity_id.clone(),
            metric: trend.metric,
            expected: "numeric",
        })?;

        let target_period = horizon_period(trend.as_of_period, horizon)?;

        let h = horizon as f64;
        let k = if trend.metric.is_volatile() {
            self.volatile_uncertainty_multiplier
        } else {
            self.uncertainty_multiplier
        };

        let point = domain.clamp(current + trend.slope * h);
        let uncertainty = trend.slope_stddev * h.sqrt() * k;

        Ok(Forecast {
            entity_id: trend.entity_id.clone(),
            metric: trend.metric,
            target_period,
            point_value: point,
            lower_bound: domain.clamp(point - uncertainty),
            upper_bound: domain.clamp(point + uncertainty),
            confidence,
        })
    }

    /// Forecasts for every week 1..=horizon, nearest first.
    pub fn project_path(
        &self,
        trend: &TrendEstimate,
        current: Option<f64>,
        horizon: usize,
        confidence: ConfidenceLevel,
    ) -> Result<Vec<Forecast>, SignalError> {
        (1..=horizon)
            .map(|h| self.forecast(trend, current, h, confidence))
            .collect()
    }
}
