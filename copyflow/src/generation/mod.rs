//! Remote text generation.
//!
//! This module provides:
//! - Request types shared by every stage
//! - The [`TextGenerator`] contract the pipeline depends on
//! - A retrying client over a single-shot [`ModelTransport`]
//! - The Anthropic Messages API transport

mod anthropic;
mod client;
mod retry;

pub use anthropic::AnthropicTransport;
pub use client::{ModelTransport, RetryingGenerator};
pub use retry::{should_retry, with_retry, RetryConfig, RetryDecision, RetryError, RetryState};

#[cfg(test)]
pub use client::MockModelTransport;

use crate::errors::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of a message turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Caller-authored turn.
    User,
    /// Model-authored turn.
    Assistant,
}

/// One role-tagged message turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who authored the turn.
    pub role: Role,
    /// Turn text.
    pub content: String,
}

impl Message {
    /// Creates a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A complete generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model identifier.
    pub model: String,
    /// Maximum output tokens.
    pub max_tokens: u32,
    /// System instruction.
    pub system: String,
    /// Ordered message turns.
    pub messages: Vec<Message>,
}

/// Model identity and output limit applied to every stage request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Model identifier.
    pub model: String,
    /// Maximum output tokens.
    pub max_tokens: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 4096,
        }
    }
}

/// Produces text for a generation request.
///
/// Implementations handle their own transient-failure policy; callers see
/// either the text or a final [`GenerationError`].
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates text for the request.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
