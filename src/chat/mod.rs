//! Chat completion client for OpenAI-compatible endpoints, in buffered and
//! incrementally streamed (SSE) modes, plus the per-session conversation
//! state.

pub mod session;
pub(crate) mod stream;


use serde::{Deserialize, Serialize};
use std::io::BufReader;
use std::time::Duration;
use tracing::debug;

use crate::config::{Config, Endpoint};
use crate::{AssistantError, Result};

// streamed completions can stay open far longer than a single round trip
const REQUEST_TIMEOUT_SECONDS: u64 = 120;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of conversation. History lives only in memory for the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[inline]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    endpoint: Endpoint,
    temperature: f32,
    max_tokens: Option<u32>,
    agent: ureq::Agent,
}

impl ChatClient {
    /// Resolve the active endpoint from configuration. Fails before any
    /// network call when the active mode has no API key.
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let endpoint = config.chat_endpoint()?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(REQUEST_TIMEOUT_SECONDS)))
            .http_status_as_error(false)
            .build()
            .into();

        Ok(Self {
            endpoint,
            temperature: config.chat.temperature,
            max_tokens: config.chat.max_tokens,
            agent,
        })
    }

    /// Buffered completion: one POST, one JSON document, the first choice's
    /// message content (empty when the provider returns none).
    #[inline]
    pub fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let mut response = self.post(messages, false)?;

        let status = response.status();
        let body = response.body_mut().read_to_string()?;
        if !status.is_success() {
            return Err(AssistantError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| anyhow::anyhow!("Failed to parse chat response: {e}"))?;

        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();

        debug!("Buffered completion returned {} chars", answer.len());
        Ok(answer)
    }

    /// Streamed completion: one POST with `stream: true`; incremental deltas
    /// are appended to the accumulated answer and pushed to `on_chunk`.
    #[inline]
    pub fn complete_streaming(
        &self,
        messages: &[ChatMessage],
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<String> {
        let mut response = self.post(messages, true)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.body_mut().read_to_string()?;
            return Err(AssistantError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let reader = BufReader::new(response.into_body().into_reader());
        let answer = stream::consume(reader, on_chunk)?;

        debug!("Streamed completion accumulated {} chars", answer.len());
        Ok(answer)
    }

    fn post(&self, messages: &[ChatMessage], stream: bool) -> Result<ureq::http::Response<ureq::Body>> {
        debug!(
            "Requesting chat completion: model {}, {} messages, stream={}",
            self.endpoint.model,
            messages.len(),
            stream
        );

        let request_json = serde_json::to_string(&ChatRequest {
            model: &self.endpoint.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream,
        })
        .map_err(|e| anyhow::anyhow!("Failed to serialize chat request: {e}"))?;

        let mut request = self
            .agent
            .post(self.endpoint.url.as_str())
            .header("Content-Type", "application/json");
        if let Some(key) = &self.endpoint.key {
            request = request.header("Authorization", &format!("Bearer {key}"));
        }

        Ok(request.send(&request_json)?)
    }
}
