//! Ingested data: MetricSample, SampleValue and weekly period arithmetic

use chrono::{Datelike, NaiveDate, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};

use super::{MetricName, SignalError};

/// Competitive unit being tracked (a brand).
pub type EntityId = String;

/// Value recorded for one metric in one period.
///
/// Untagged so sample files can carry plain JSON numbers for numeric metrics
/// and plain strings for categorical ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    Numeric(f64),
    Category(String),
}

impl SampleValue {
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Self::Numeric(v) => Some(*v),
            Self::Category(_) => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            Self::Numeric(_) => None,
            Self::Category(c) => Some(c),
        }
    }
}

/// One weekly aggregate for one (entity, metric).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub entity_id: EntityId,
    /// Monday of the week the aggregate covers
    pub period_start: NaiveDate,
    pub metric: MetricName,
    pub value: SampleValue,
    /// Number of creatives the aggregate was computed from
    #[serde(default)]
    pub sample_count: u32,
}

impl MetricSample {
    /// Data-quality checks applied before a sample may enter the store.
    ///
    /// Rejects misaligned periods, numeric values for categorical metrics (and
    /// vice versa), and numeric values outside the metric's declared domain.
    /// Out-of-domain values are never clamped here.
    pub fn validate(&self) -> Result<(), SignalError> {
        if !is_period_start(self.period_start) {
            return Err(SignalError::MisalignedPeriod(self.period_start));
        }

        match (&self.value, self.metric.domain()) {
            (SampleValue::Numeric(v), Some(domain)) => {
                if domain.contains(*v) {
                    Ok(())
                } else {
                    Err(SignalError::OutOfDomainValue {
                        entity_id: self.entity_id.clone(),
                        metric: self.metric,
                        period_start: self.period_start,
                        value: *v,
                        domain,
                    })
                }
            }
            (SampleValue::Category(label), None) if !label.trim().is_empty() => Ok(()),
            (_, domain) => Err(SignalError::ValueKindMismatch {
                entity_id: self.entity_id.clone(),
                metric: self.metric,
                expected: if domain.is_some() {
                    "numeric value"
                } else {
                    "non-empty category label"
                },
            }),
        }
    }
}

// ============================================================================
// Period arithmetic (one period = one ISO week starting Monday)
// ============================================================================

/// Whether `date` is a valid period start.
pub fn is_period_start(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Mon
}

/// Monday of the week containing `date`.
pub fn period_containing(date: NaiveDate) -> NaiveDate {
    date - TimeDelta::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Period start `periods` weeks after (or before, if negative) `period`.
///
/// `None` when the result falls outside chrono's calendar.
pub fn offset_period(period: NaiveDate, periods: i64) -> Option<NaiveDate> {
    TimeDelta::try_weeks(periods).and_then(|delta| period.checked_add_signed(delta))
}

/// Target period `horizon` weeks past `as_of`.
pub fn horizon_period(as_of: NaiveDate, horizon: usize) -> Result<NaiveDate, SignalError> {
    i64::try_from(horizon)
        .ok()
        .and_then(|weeks| offset_period(as_of, weeks))
        .ok_or_else(|| {
            SignalError::InvalidRequest(format!(
                "forecast horizon of {horizon} weeks past {as_of} is outside the supported calendar"
            ))
        })
}
