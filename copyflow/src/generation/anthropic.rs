//! Anthropic Messages API transport.

use super::{GenerationRequest, ModelTransport, Role};
use crate::config::GenerationConfig;
use crate::errors::{CopyflowError, UpstreamError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MESSAGES_PATH: &str = "/v1/messages";

#[derive(Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<MessageBody<'a>>,
}

#[derive(Serialize)]
struct MessageBody<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn build_body(request: &GenerationRequest) -> MessagesBody<'_> {
    MessagesBody {
        model: &request.model,
        max_tokens: request.max_tokens,
        system: &request.system,
        messages: request
            .messages
            .iter()
            .map(|m| MessageBody {
                role: role_to_str(m.role),
                content: &m.content,
            })
            .collect(),
    }
}

// Falls back to the raw body when it is not the documented error envelope.
fn parse_error(status: u16, body: &str) -> UpstreamError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => UpstreamError::with_status(
            status,
            format!("{}: {}", envelope.error.kind, envelope.error.message),
        ),
        Err(_) if body.trim().is_empty() => UpstreamError::with_status(status, "empty response body"),
        Err(_) => UpstreamError::with_status(status, body.trim()),
    }
}

fn collect_text(response: MessagesResponse) -> String {
    response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("")
}

fn map_http_error(error: &reqwest::Error) -> UpstreamError {
    UpstreamError::new(error.status().map(|s| s.as_u16()), error.to_string())
}

/// Sends generation requests to the Anthropic Messages API.
pub struct AnthropicTransport {
    client: Client,
    api_key: String,
    base_url: String,
    api_version: String,
}

impl std::fmt::Debug for AnthropicTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicTransport")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl AnthropicTransport {
    /// Creates a transport with an explicit key, endpoint and request timeout.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        api_version: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CopyflowError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CopyflowError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version: api_version.into(),
        })
    }

    /// Creates a transport from the generation configuration.
    ///
    /// Fails when no API key has been configured.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, CopyflowError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CopyflowError::Config("ANTHROPIC_API_KEY is not set".to_string()))?;

        Self::new(
            api_key,
            config.base_url.as_str(),
            config.api_version.as_str(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

#[async_trait]
impl ModelTransport for AnthropicTransport {
    async fn send(&self, request: &GenerationRequest) -> Result<String, UpstreamError> {
        let url = format!("{}{MESSAGES_PATH}", self.base_url);

        tracing::debug!(model = %request.model, max_tokens = request.max_tokens, "Sending generation request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&build_body(request))
            .send()
            .await
            .map_err(|e| map_http_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &body));
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| {
            UpstreamError::new(Some(status.as_u16()), format!("Failed to parse response: {e}"))
        })?;

        Ok(collect_text(parsed))
    }
}
