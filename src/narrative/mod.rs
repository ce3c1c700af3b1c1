//! Narrative generation
//!
//! The engine only builds [`NarrativeRequest`]s. Turning them into prose is
//! the job of an external text-generation service reached through a
//! [`NarrativeBackend`]; [`NarrativeDispatcher`] fans requests out to it with
//! bounded concurrency, a per-request timeout and retries.

mod dispatch;
mod http;
mod request;

pub use dispatch::{NarrativeDispatcher, NarrativeOutcome};
pub use http::HttpNarrativeBackend;
pub use request::NarrativeRequest;

use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned status {0}")]
    ServerError(reqwest::StatusCode),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A service that writes narrative text for one signal.
#[async_trait]
pub trait NarrativeBackend: Send + Sync {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String, NarrativeError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}
