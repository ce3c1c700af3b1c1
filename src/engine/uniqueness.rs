//! Cross-entity uniqueness
//!
//! For each metric the cross-section of every entity's value at the as-of
//! period is summarized once per run into a [`UniquenessIndex`]; entity
//! scores are then read against that shared summary.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::store::MetricSeriesStore;
use crate::types::{ChangeBasis, MetricName, SampleValue, SignalError};

#[derive(Debug, Clone, PartialEq)]
enum CrossSection {
    Numeric { mean: f64, entities: usize },
    Categorical { counts: BTreeMap<String, usize>, entities: usize },
}

impl CrossSection {
    fn entities(&self) -> usize {
        match self {
            Self::Numeric { entities, .. } | Self::Categorical { entities, .. } => *entities,
        }
    }
}

fn category_key(label: &str) -> String {
    label.trim().to_ascii_lowercase()
}

/// Per-metric cross-entity summaries for one period.
#[derive(Debug, Clone)]
pub struct UniquenessIndex {
    period: NaiveDate,
    sections: BTreeMap<MetricName, CrossSection>,
}

impl UniquenessIndex {
    pub fn build(store: &MetricSeriesStore, period: NaiveDate) -> Self {
        let mut sections = BTreeMap::new();
        for metric in MetricName::ALL {
            let values = store.cross_section(metric, period);
            let section = if metric.is_categorical() {
                let mut counts: BTreeMap<String, usize> = BTreeMap::new();
                for label in values.iter().filter_map(|(_, v)| v.as_category()) {
                    *counts.entry(category_key(label)).or_default() += 1;
                }
                CrossSection::Categorical {
                    entities: counts.values().sum(),
                    counts,
                }
            } else {
                let numbers: Vec<f64> = values.iter().filter_map(|(_, v)| v.as_numeric()).collect();
                let mean = if numbers.is_empty() {
                    0.0
                } else {
                    numbers.iter().sum::<f64>() / numbers.len() as f64
                };
                CrossSection::Numeric {
                    mean,
                    entities: numbers.len(),
                }
            };
            sections.insert(metric, section);
        }
        Self { period, sections }
    }

    pub fn period(&self) -> NaiveDate {
        self.period
    }

    /// Mean of the numeric cross-section, if any entity reported the metric.
    pub fn mean(&self, metric: MetricName) -> Option<f64> {
        match self.sections.get(&metric) {
            Some(CrossSection::Numeric { mean, entities }) if *entities > 0 => Some(*mean),
            _ => None,
        }
    }

    /// How far `value` sits from the rest of the field for `metric`.
    ///
    /// Numeric: `|value - mean|`, divided by `max(mean, 1)` for count
    /// metrics. Categorical: `1 - share of entities with the same label`.
    /// Fewer than two reporting entities is `MissingCrossEntityData`.
    pub fn score(&self, metric: MetricName, value: &SampleValue) -> Result<f64, SignalError> {
        let section = self.sections.get(&metric);
        let present = section.map(CrossSection::entities).unwrap_or(0);
        if present < 2 {
            return Err(SignalError::MissingCrossEntityData {
                metric,
                period: self.period,
                entities_present: present,
            });
        }

        match (section, value) {
            (Some(CrossSection::Numeric { mean, .. }), SampleValue::Numeric(v)) => {
                let distance = (v - mean).abs();
                Ok(match metric.change_basis() {
                    ChangeBasis::Absolute => distance,
                    ChangeBasis::Relative => distance / mean.abs().max(1.0),
                })
            }
            (Some(CrossSection::Categorical { counts, entities }), SampleValue::Category(label)) => {
                let same = counts.get(&category_key(label)).copied().unwrap_or(0);
                Ok(1.0 - same as f64 / *entities as f64)
            }
            _ => Err(SignalError::ValueKindMismatch {
                entity_id: String::new(),
                metric,
                expected: if metric.is_categorical() { "category label" } else { "numeric" },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetricSample;

    fn period() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 23).unwrap()
    }

    fn store(values: &[(&str, MetricName, SampleValue)]) -> MetricSeriesStore {
        let mut store = MetricSeriesStore::new();
        for (entity, metric, value) in values {
            store
                .ingest(MetricSample {
                    entity_id: entity.to_string(),
                    period_start: period(),
                    metric: *metric,
                    value: value.clone(),
                    sample_count: 12,
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn entity_at_mean_scores_zero_and_furthest_scores_max() {
        let m = MetricName::UrgencyLevel;
        let values = [0.2, 0.4, 0.4, 0.4, 0.6];
        let names = ["a", "b", "c", "d", "e"];
        let rows: Vec<_> = names
            .iter()
            .zip(values)
            .map(|(n, v)| (*n, m, SampleValue::Numeric(v)))
            .collect();
        let index = UniquenessIndex::build(&store(&rows), period());

        let at_mean = index.score(m, &SampleValue::Numeric(0.4)).unwrap();
        assert!(at_mean.abs() < 1e-12);

        let scores: Vec<f64> = values
            .iter()
            .map(|v| index.score(m, &SampleValue::Numeric(*v)).unwrap())
            .collect();
        let max = scores.iter().copied().fold(f64::MIN, f64::max);
        assert!((scores[0] - max).abs() < 1e-12);
        assert!((max - 0.2).abs() < 1e-9);
    }

    #[test]
    fn furthest_of_five_is_unique_max() {
        let m = MetricName::VideoShare;
        let rows: Vec<_> = [("a", 0.1), ("b", 0.15), ("c", 0.2), ("d", 0.25), ("e", 0.9)]
            .iter()
            .map(|(n, v)| (*n, m, SampleValue::Numeric(*v)))
            .collect();
        let index = UniquenessIndex::build(&store(&rows), period());
        let furthest = index.score(m, &SampleValue::Numeric(0.9)).unwrap();
        for v in [0.1, 0.15, 0.2, 0.25] {
            assert!(index.score(m, &SampleValue::Numeric(v)).unwrap() < furthest);
        }
    }

    #[test]
    fn single_entity_is_missing_cross_data() {
        let m = MetricName::UrgencyLevel;
        let index = UniquenessIndex::build(&store(&[("a", m, SampleValue::Numeric(0.5))]), period());
        let err = index.score(m, &SampleValue::Numeric(0.5)).unwrap_err();
        assert!(matches!(
            err,
            SignalError::MissingCrossEntityData { entities_present: 1, .. }
        ));
    }

    #[test]
    fn count_distance_is_relative_to_mean() {
        let m = MetricName::ActiveCreatives;
        let index = UniquenessIndex::build(
            &store(&[
                ("a", m, SampleValue::Numeric(10.0)),
                ("b", m, SampleValue::Numeric(30.0)),
            ]),
            period(),
        );
        let score = index.score(m, &SampleValue::Numeric(30.0)).unwrap();
        assert!((score - 0.5).abs() < 1e-9);
        assert_eq!(index.mean(m), Some(20.0));
    }

    #[test]
    fn categorical_uniqueness_is_minority_share() {
        let m = MetricName::DominantMessageAngle;
        let cat = |s: &str| SampleValue::Category(s.to_string());
        let index = UniquenessIndex::build(
            &store(&[
                ("a", m, cat("price")),
                ("b", m, cat("price")),
                ("c", m, cat("Price")),
                ("d", m, cat("lifestyle")),
            ]),
            period(),
        );
        assert!((index.score(m, &cat("price")).unwrap() - 0.25).abs() < 1e-12);
        assert!((index.score(m, &cat("lifestyle")).unwrap() - 0.75).abs() < 1e-12);
    }
}
