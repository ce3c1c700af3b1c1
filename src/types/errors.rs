//! Engine error taxonomy and per-metric omission records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Domain, EntityId, MetricName};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("Insufficient history for {entity_id}/{metric}: have {available} contiguous periods, need {required}")]
    InsufficientHistory {
        entity_id: EntityId,
        metric: MetricName,
        available: usize,
        required: usize,
    },

    #[error("Out-of-domain value for {entity_id}/{metric} at {period_start}: {value} not in {domain}")]
    OutOfDomainValue {
        entity_id: EntityId,
        metric: MetricName,
        period_start: NaiveDate,
        value: f64,
        domain: Domain,
    },

    #[error("Missing cross-entity data for {metric} at {period}: {entities_present} entities present, need 2")]
    MissingCrossEntityData {
        metric: MetricName,
        period: NaiveDate,
        entities_present: usize,
    },

    #[error("No current value for {entity_id}/{metric} at {period}")]
    MissingCurrentValue {
        entity_id: EntityId,
        metric: MetricName,
        period: NaiveDate,
    },

    #[error("Duplicate sample for {entity_id}/{metric} at {period_start}")]
    DuplicateSample {
        entity_id: EntityId,
        metric: MetricName,
        period_start: NaiveDate,
    },

    #[error("Period {0} does not start on a Monday")]
    MisalignedPeriod(NaiveDate),

    #[error("Value kind mismatch for {entity_id}/{metric}: expected {expected}")]
    ValueKindMismatch {
        entity_id: EntityId,
        metric: MetricName,
        expected: &'static str,
    },

    #[error("Invalid ranking request: {0}")]
    InvalidRequest(String),
}

impl SignalError {
    /// Errors that exclude one (entity, metric) pair from a ranking pass
    /// instead of failing the run.
    pub fn omission_kind(&self) -> Option<OmissionKind> {
        match self {
            Self::InsufficientHistory { .. } => Some(OmissionKind::InsufficientHistory),
            Self::MissingCurrentValue { .. } => Some(OmissionKind::MissingCurrentValue),
            Self::MissingCrossEntityData { .. } => Some(OmissionKind::MissingCrossEntityData),
            _ => None,
        }
    }
}

/// Why a metric produced no signal for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OmissionKind {
    InsufficientHistory,
    MissingCurrentValue,
    MissingCrossEntityData,
}

/// Recorded exclusion of one metric from an entity's ranked set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Omission {
    pub metric: MetricName,
    pub kind: OmissionKind,
    pub detail: String,
}

impl Omission {
    /// Convert a recoverable error into an omission; fatal errors yield `None`.
    pub fn from_error(metric: MetricName, err: &SignalError) -> Option<Self> {
        err.omission_kind().map(|kind| Self {
            metric,
            kind,
            detail: err.to_string(),
        })
    }
}
