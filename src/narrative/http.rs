//! HTTP JSON narrative backend
//!
//! POSTs the request fields plus a rendered `prompt` to the endpoint and
//! expects `{"text": "..."}` back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{NarrativeBackend, NarrativeError, NarrativeRequest};

#[derive(Serialize)]
struct NarrativePayload<'a> {
    #[serde(flatten)]
    request: &'a NarrativeRequest,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct NarrativeResponse {
    text: String,
}

#[derive(Clone)]
pub struct HttpNarrativeBackend {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpNarrativeBackend {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, NarrativeError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl NarrativeBackend for HttpNarrativeBackend {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String, NarrativeError> {
        let payload = NarrativePayload {
            request,
            prompt: request.prompt(),
        };

        let resp = self.http.post(&self.endpoint).json(&payload).send().await?;
        if !resp.status().is_success() {
            return Err(NarrativeError::ServerError(resp.status()));
        }

        let body = resp.bytes().await?;
        let parsed: NarrativeResponse = serde_json::from_slice(&body)?;
        Ok(parsed.text)
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConfidenceLevel, MetricName, SeasonalContext, SignalClassification};
    use chrono::NaiveDate;

    #[test]
    fn payload_flattens_request_and_adds_prompt() {
        let request = NarrativeRequest {
            entity_id: "acme".to_string(),
            metric: MetricName::VideoShare,
            target_period: NaiveDate::from_ymd_opt(2024, 10, 21).unwrap(),
            classification: SignalClassification::Pullback,
            current_value: Some(0.5),
            forecast_value: Some(0.35),
            change_magnitude: 0.15,
            confidence: ConfidenceLevel::Medium,
            seasonal_context: SeasonalContext::Regular,
            business_impact: 3,
            category_shift: None,
        };
        let payload = NarrativePayload {
            request: &request,
            prompt: request.prompt(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["entity_id"], "acme");
        assert_eq!(json["classification"], "PULLBACK");
        assert!(json["prompt"].as_str().unwrap().contains("video_share"));
    }

    #[test]
    fn endpoint_trailing_slash_trimmed() {
        let backend = HttpNarrativeBackend::new("http://localhost:9000/narrate/", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.endpoint(), "http://localhost:9000/narrate");
        assert_eq!(backend.backend_name(), "http");
    }
}
