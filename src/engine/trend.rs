//! Trailing-window trend estimation
//!
//! `slope = (value[P] - value[P-W]) / W` over the W+1 contiguous weeks ending
//! at P. The per-period deltas inside the window give the dispersion used for
//! confidence and uncertainty, and a one-sample t-test on those deltas gives
//! the trend's significance (p-value via statrs).

use chrono::NaiveDate;
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;

use crate::store::MetricSeriesStore;
use crate::types::{MetricName, SignalError, TrendEstimate};

/// Deltas whose stddev falls below this are treated as perfectly regular.
const DEGENERATE_STDDEV: f64 = 1e-12;

/// Slope estimator over a fixed trailing window.
#[derive(Debug, Clone)]
pub struct TrendEstimator {
    window_size: usize,
}

impl TrendEstimator {
    /// `window_size` is W; the estimator reads W+1 periods.
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Estimate the trend for one (entity, metric) as of `as_of`.
    ///
    /// Fewer than W+1 contiguous periods is a hard `InsufficientHistory`
    /// error; no value is extrapolated from a shorter series.
    pub fn estimate(
        &self,
        store: &MetricSeriesStore,
        entity_id: &str,
        metric: MetricName,
        as_of: NaiveDate,
    ) -> Result<TrendEstimate, SignalError> {
        let values =
            store.trailing_numeric(entity_id, metric, as_of, self.window_size.saturating_add(1))?;
        Ok(self.from_window(entity_id, metric, as_of, &values))
    }

    /// Build an estimate from an oldest-first window of exactly W+1 values.
    pub fn from_window(
        &self,
        entity_id: &str,
        metric: MetricName,
        as_of: NaiveDate,
        values: &[f64],
    ) -> TrendEstimate {
        let first = values.first().copied().unwrap_or(0.0);
        let last = values.last().copied().unwrap_or(0.0);
        let w = values.len().saturating_sub(1).max(1);

        let deltas: Vec<f64> = values.windows(2).map(|pair| pair[1] - pair[0]).collect();
        let slope = (last - first) / w as f64;

        // statrs returns NaN for fewer than two deltas; overflowed dispersion
        // stays maximal rather than reading as perfectly regular
        let stddev = deltas.iter().std_dev();
        let slope_stddev = if stddev.is_nan() { 0.0 } else { stddev.min(f64::MAX) };

        TrendEstimate {
            entity_id: entity_id.to_string(),
            metric,
            as_of_period: as_of,
            slope,
            slope_stddev,
            window_size: w,
            p_value: Self::p_value_for_deltas(slope, slope_stddev, deltas.len()),
        }
    }

    /// Two-tailed p-value that the mean per-period delta differs from zero.
    ///
    /// The mean of the deltas telescopes to the slope, so t = slope / (sd / sqrt(n)).
    fn p_value_for_deltas(mean: f64, sd: f64, n: usize) -> f64 {
        if n < 2 {
            return 1.0;
        }
        if sd < DEGENERATE_STDDEV {
            return if mean.abs() < DEGENERATE_STDDEV { 1.0 } else { 0.0 };
        }

        let df = (n - 1) as f64;
        let t_stat = mean / (sd / (n as f64).sqrt());

        match StudentsT::new(0.0, 1.0, df) {
            Ok(t_dist) => (2.0 * (1.0 - t_dist.cdf(t_stat.abs()))).clamp(0.0, 1.0),
            Err(_) => 1.0,
        }
    }
}
