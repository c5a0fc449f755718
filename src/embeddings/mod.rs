
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::{Config, Endpoint};
use crate::{AssistantError, Result};

const REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Client for an OpenAI-compatible embeddings endpoint.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    endpoint: Endpoint,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbedDatum {
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    /// Resolve the active endpoint from configuration. Fails before any
    /// network call when the active mode has no API key.
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let endpoint = config.embedding_endpoint()?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(REQUEST_TIMEOUT_SECONDS)))
            .http_status_as_error(false)
            .build()
            .into();

        Ok(Self { endpoint, agent })
    }

    /// Embed one query string. Exactly one network call; not retried.
    #[inline]
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(
            "Embedding query (length {}) with model {}",
            text.len(),
            self.endpoint.model
        );

        let request_json = serde_json::to_string(&EmbedRequest {
            model: &self.endpoint.model,
            input: text,
        })
        .map_err(|e| anyhow!("Failed to serialize embedding request: {e}"))?;

        let mut request = self
            .agent
            .post(self.endpoint.url.as_str())
            .header("Content-Type", "application/json");
        if let Some(key) = &self.endpoint.key {
            request = request.header("Authorization", &format!("Bearer {key}"));
        }

        let mut response = request.send(&request_json)?;

        let status = response.status();
        let body = response.body_mut().read_to_string()?;
        if !status.is_success() {
            return Err(AssistantError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbedResponse = serde_json::from_str(&body)
            .map_err(|e| anyhow!("Failed to parse embedding response: {e}"))?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|datum| datum.embedding)
            .ok_or_else(|| anyhow!("Embedding response contained no data"))?;

        debug!("Received embedding with {} dimensions", vector.len());
        Ok(vector)
    }
}
