//! Bounded, retried narrative dispatch

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{NarrativeBackend, NarrativeError, NarrativeRequest};
use crate::config::NarrativeConfig;
use crate::types::{EntityId, MetricName};

/// Result of narrating one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeOutcome {
    pub entity_id: EntityId,
    pub metric: MetricName,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NarrativeOutcome {
    pub fn is_success(&self) -> bool {
        self.text.is_some()
    }
}

pub struct NarrativeDispatcher {
    backend: Arc<dyn NarrativeBackend>,
    timeout: Duration,
    max_concurrency: usize,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl NarrativeDispatcher {
    pub fn new(backend: Arc<dyn NarrativeBackend>, config: &NarrativeConfig) -> Self {
        Self {
            backend,
            timeout: Duration::from_secs(config.timeout_secs),
            max_concurrency: config.max_concurrency.max(1),
            max_attempts: config.max_attempts.max(1),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Narrate every request, at most `max_concurrency` in flight.
    ///
    /// Outcomes come back in request order. Failures are recorded on their
    /// outcome and never abort the batch.
    pub async fn dispatch(&self, requests: Vec<NarrativeRequest>) -> Vec<NarrativeOutcome> {
        let total = requests.len();
        let outcomes: Vec<NarrativeOutcome> = stream::iter(requests)
            .map(|request| self.narrate(request))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        info!(
            backend = self.backend.backend_name(),
            total,
            succeeded,
            failed = total - succeeded,
            "Narrative dispatch complete"
        );
        outcomes
    }

    async fn narrate(&self, request: NarrativeRequest) -> NarrativeOutcome {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            let result = match tokio::time::timeout(self.timeout, self.backend.generate(&request)).await {
                Ok(result) => result,
                Err(_) => Err(NarrativeError::Timeout(self.timeout)),
            };

            match result {
                Ok(text) => {
                    debug!(entity = %request.entity_id, metric = %request.metric, attempt, "Narrative generated");
                    return NarrativeOutcome {
                        entity_id: request.entity_id,
                        metric: request.metric,
                        attempts: attempt,
                        text: Some(text),
                        error: None,
                    };
                }
                Err(e) => {
                    warn!(
                        entity = %request.entity_id,
                        metric = %request.metric,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Narrative request failed"
                    );
                    last_error = Some(e);
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.retry_backoff * 2u32.saturating_pow(attempt - 1)).await;
                    }
                }
            }
        }

        NarrativeOutcome {
            entity_id: request.entity_id,
            metric: request.metric,
            attempts: self.max_attempts,
            text: None,
            error: last_error.map(|e| e.to_string()),
        }
    }
}
