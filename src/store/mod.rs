//! Metric Series Store - the single source of truth for weekly metric history
//!
//! Holds one value per (entity, metric, period) in ordered maps so every
//! query, and everything derived from it, iterates in a deterministic order.
//! Samples are validated before insertion: out-of-domain values, misaligned
//! periods, kind mismatches and duplicates never enter the store.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = MetricSeriesStore::new();
//! store.ingest(sample)?;
//! let window = store.trailing_numeric("acme", MetricName::UrgencyLevel, as_of, 5)?;
//! ```

mod loader;

pub use loader::{load_samples_file, StoreError};

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::types::{offset_period, EntityId, MetricName, MetricSample, SampleValue, SignalError};

#[derive(Debug, Clone, PartialEq)]
struct RecordedValue {
    value: SampleValue,
    sample_count: u32,
}

type Series = BTreeMap<NaiveDate, RecordedValue>;

/// In-memory table of (entity, period, metric) -> value.
#[derive(Debug, Clone, Default)]
pub struct MetricSeriesStore {
    series: BTreeMap<EntityId, BTreeMap<MetricName, Series>>,
    sample_total: usize,
}

/// A sample refused at ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedSample {
    /// Position in the ingested batch (0-based)
    pub index: usize,
    /// 1-based source line, for samples read from a JSON-lines file
    pub line: Option<usize>,
    pub error: SignalError,
}

/// Outcome of a batch ingestion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub accepted: usize,
    pub rejected: Vec<RejectedSample>,
}

impl MetricSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and record one sample.
    ///
    /// Recorded samples are immutable: a second sample for the same
    /// (entity, metric, period) is rejected, not merged.
    pub fn ingest(&mut self, sample: MetricSample) -> Result<(), SignalError> {
        sample.validate()?;

        let series = self
            .series
            .entry(sample.entity_id.clone())
            .or_default()
            .entry(sample.metric)
            .or_default();

        if series.contains_key(&sample.period_start) {
            return Err(SignalError::DuplicateSample {
                entity_id: sample.entity_id,
                metric: sample.metric,
                period_start: sample.period_start,
            });
        }

        series.insert(
            sample.period_start,
            RecordedValue {
                value: sample.value,
                sample_count: sample.sample_count,
            },
        );
        self.sample_total += 1;
        Ok(())
    }

    /// Ingest many samples, collecting rejections instead of stopping at the first.
    pub fn ingest_batch<I>(&mut self, samples: I) -> IngestReport
    where
        I: IntoIterator<Item = MetricSample>,
    {
        self.ingest_located(samples.into_iter().map(|sample| (None, sample)))
    }

    /// Batch ingestion where each sample may carry the source line it came from.
    fn ingest_located<I>(&mut self, samples: I) -> IngestReport
    where
        I: IntoIterator<Item = (Option<usize>, MetricSample)>,
    {
        let mut report = IngestReport::default();
        for (index, (line, sample)) in samples.into_iter().enumerate() {
            match self.ingest(sample) {
                Ok(()) => report.accepted += 1,
                Err(error) => {
                    warn!(index, line, error = %error, "Rejected metric sample");
                    report.rejected.push(RejectedSample { index, line, error });
                }
            }
        }
        debug!(
            accepted = report.accepted,
            rejected = report.rejected.len(),
            total = self.sample_total,
            "Batch ingested"
        );
        report
    }

    /// Number of recorded samples.
    pub fn len(&self) -> usize {
        self.sample_total
    }

    pub fn is_empty(&self) -> bool {
        self.sample_total == 0
    }

    /// All entities with at least one sample, in sorted order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityId> {
        self.series.keys()
    }

    pub fn contains_entity(&self, entity_id: &str) -> bool {
        self.series.contains_key(entity_id)
    }

    /// Most recent period with any sample.
    pub fn latest_period(&self) -> Option<NaiveDate> {
        self.series
            .values()
            .flat_map(|metrics| metrics.values())
            .filter_map(|series| series.keys().next_back().copied())
            .max()
    }

    fn series_for(&self, entity_id: &str, metric: MetricName) -> Option<&Series> {
        self.series.get(entity_id).and_then(|m| m.get(&metric))
    }

    pub fn value(&self, entity_id: &str, metric: MetricName, period: NaiveDate) -> Option<&SampleValue> {
        self.series_for(entity_id, metric)
            .and_then(|s| s.get(&period))
            .map(|r| &r.value)
    }

    pub fn numeric_value(&self, entity_id: &str, metric: MetricName, period: NaiveDate) -> Option<f64> {
        self.value(entity_id, metric, period)
            .and_then(SampleValue::as_numeric)
    }

    /// Number of creatives behind a recorded aggregate.
    pub fn sample_count(&self, entity_id: &str, metric: MetricName, period: NaiveDate) -> Option<u32> {
        self.series_for(entity_id, metric)
            .and_then(|s| s.get(&period))
            .map(|r| r.sample_count)
    }

    /// The `len` contiguous numeric values ending at `end`, oldest first.
    ///
    /// Errors:
    /// - `MissingCurrentValue` when `end` itself has no value
    /// - `InsufficientHistory` when fewer than `len` contiguous weeks exist;
    ///   a missing week inside the window breaks contiguity
    pub fn trailing_numeric(
        &self,
        entity_id: &str,
        metric: MetricName,
        end: NaiveDate,
        len: usize,
    ) -> Result<Vec<f64>, SignalError> {
        if self.numeric_value(entity_id, metric, end).is_none() {
            return Err(SignalError::MissingCurrentValue {
                entity_id: entity_id.to_string(),
                metric,
                period: end,
            });
        }

        // Walk back from `end` until the first gap
        let mut values = Vec::new();
        let mut period = Some(end);
        while values.len() < len {
            match period.and_then(|p| self.numeric_value(entity_id, metric, p)) {
                Some(v) => values.push(v),
                None => break,
            }
            period = period.and_then(|p| offset_period(p, -1));
        }

        if values.len() < len {
            return Err(SignalError::InsufficientHistory {
                entity_id: entity_id.to_string(),
                metric,
                available: values.len(),
                required: len,
            });
        }

        values.reverse();
        Ok(values)
    }

    /// Dominant category at `period` and at the period before it.
    pub fn category_transition(
        &self,
        entity_id: &str,
        metric: MetricName,
        period: NaiveDate,
    ) -> Result<(String, String), SignalError> {
        let current = self
            .value(entity_id, metric, period)
            .and_then(SampleValue::as_category)
            .ok_or_else(|| SignalError::MissingCurrentValue {
                entity_id: entity_id.to_string(),
                metric,
                period,
            })?;

        let prior = offset_period(period, -1)
            .and_then(|previous| self.value(entity_id, metric, previous))
            .and_then(SampleValue::as_category)
            .ok_or_else(|| SignalError::InsufficientHistory {
                entity_id: entity_id.to_string(),
                metric,
                available: 1,
                required: 2,
            })?;

        Ok((prior.to_string(), current.to_string()))
    }

    /// Every entity's value for `metric` at `period`, in entity order.
    pub fn cross_section(&self, metric: MetricName, period: NaiveDate) -> Vec<(&EntityId, &SampleValue)> {
        self.series
            .iter()
            .filter_map(|(entity, metrics)| {
                metrics
                    .get(&metric)
                    .and_then(|s| s.get(&period))
                    .map(|r| (entity, &r.value))
            })
            .collect()
    }

    /// Flatten the store back into samples (entity, metric, period order).
    pub fn samples(&self) -> Vec<MetricSample> {
        let mut out = Vec::with_capacity(self.sample_total);
        for (entity, metrics) in &self.series {
            for (metric, series) in metrics {
                for (period, recorded) in series {
                    out.push(MetricSample {
                        entity_id: entity.clone(),
                        period_start: *period,
                        metric: *metric,
                        value: recorded.value.clone(),
                        sample_count: recorded.sample_count,
                    });
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week(n: i64) -> NaiveDate {
        offset_period(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(), n).unwrap()
    }

    fn numeric(entity: &str, metric: MetricName, period: NaiveDate, v: f64) -> MetricSample {
        MetricSample {
            entity_id: entity.to_string(),
            period_start: period,
            metric,
            value: SampleValue::Numeric(v),
            sample_count: 10,
        }
    }

    fn category(entity: &str, period: NaiveDate, label: &str) -> MetricSample {
        MetricSample {
            entity_id: entity.to_string(),
            period_start: period,
            metric: MetricName::DominantMessageAngle,
            value: SampleValue::Category(label.to_string()),
            sample_count: 10,
        }
    }

    #[test]
    fn duplicate_sample_rejected() {
        let mut store = MetricSeriesStore::new();
        store
            .ingest(numeric("acme", MetricName::UrgencyLevel, week(0), 0.3))
            .unwrap();
        let err = store
            .ingest(numeric("acme", MetricName::UrgencyLevel, week(0), 0.4))
            .unwrap_err();
        assert!(matches!(err, SignalError::DuplicateSample { .. }));
        assert_eq!(store.numeric_value("acme", MetricName::UrgencyLevel, week(0)), Some(0.3));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn out_of_domain_never_enters_store() {
        let mut store = MetricSeriesStore::new();
        let report = store.ingest_batch(vec![
            numeric("acme", MetricName::VideoShare, week(0), 0.5),
            numeric("acme", MetricName::VideoShare, week(1), 1.7),
        ]);
        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].index, 1);
        assert_eq!(report.rejected[0].line, None);
        assert!(store.value("acme", MetricName::VideoShare, week(1)).is_none());
    }

    #[test]
    fn trailing_window_is_oldest_first() {
        let mut store = MetricSeriesStore::new();
        for (i, v) in [0.20, 0.22, 0.24, 0.26].iter().enumerate() {
            store
                .ingest(numeric("acme", MetricName::PromotionalIntensity, week(i as i64), *v))
                .unwrap();
        }
        let window = store
            .trailing_numeric("acme", MetricName::PromotionalIntensity, week(3), 4)
            .unwrap();
        assert_eq!(window, vec![0.20, 0.22, 0.24, 0.26]);
    }

    #[test]
    fn gap_breaks_contiguity() {
        let mut store = MetricSeriesStore::new();
        for i in [0, 1, 3, 4] {
            store
                .ingest(numeric("acme", MetricName::UrgencyLevel, week(i), 0.5))
                .unwrap();
        }
        let err = store
            .trailing_numeric("acme", MetricName::UrgencyLevel, week(4), 4)
            .unwrap_err();
        assert!(matches!(
            err,
            SignalError::InsufficientHistory { available: 2, required: 4, .. }
        ));
    }

    #[test]
    fn oversized_window_request_is_insufficient_history() {
        let mut store = MetricSeriesStore::new();
        for i in 0..3 {
            store
                .ingest(numeric("acme", MetricName::UrgencyLevel, week(i), 0.5))
                .unwrap();
        }
        let err = store
            .trailing_numeric("acme", MetricName::UrgencyLevel, week(2), usize::MAX)
            .unwrap_err();
        assert!(matches!(
            err,
            SignalError::InsufficientHistory { available: 3, required: usize::MAX, .. }
        ));
    }

    #[test]
    fn missing_current_reported_separately() {
        let mut store = MetricSeriesStore::new();
        store
            .ingest(numeric("acme", MetricName::UrgencyLevel, week(0), 0.5))
            .unwrap();
        let err = store
            .trailing_numeric("acme", MetricName::UrgencyLevel, week(1), 2)
            .unwrap_err();
        assert!(matches!(err, SignalError::MissingCurrentValue { .. }));
    }

    #[test]
    fn category_transition_needs_prior_week() {
        let mut store = MetricSeriesStore::new();
        store.ingest(category("acme", week(1), "price")).unwrap();
        assert!(matches!(
            store.category_transition("acme", MetricName::DominantMessageAngle, week(1)),
            Err(SignalError::InsufficientHistory { .. })
        ));

        store.ingest(category("acme", week(0), "lifestyle")).unwrap();
        let (prior, current) = store
            .category_transition("acme", MetricName::DominantMessageAngle, week(1))
            .unwrap();
        assert_eq!(prior, "lifestyle");
        assert_eq!(current, "price");
    }

    #[test]
    fn cross_section_and_latest_period() {
        let mut store = MetricSeriesStore::new();
        store
            .ingest(numeric("beta", MetricName::VideoShare, week(2), 0.4))
            .unwrap();
        store
            .ingest(numeric("acme", MetricName::VideoShare, week(2), 0.2))
            .unwrap();
        store
            .ingest(numeric("acme", MetricName::VideoShare, week(1), 0.1))
            .unwrap();

        let section = store.cross_section(MetricName::VideoShare, week(2));
        let entities: Vec<&str> = section.iter().map(|(e, _)| e.as_str()).collect();
        assert_eq!(entities, vec!["acme", "beta"]);
        assert_eq!(store.latest_period(), Some(week(2)));
        assert_eq!(store.samples().len(), 3);
    }
}
