//! Application configuration.
//!
//! Configuration is read from an optional TOML file and then overridden by
//! environment variables. Every field has a default, so an empty file (or no
//! file) yields a usable configuration apart from the API key.

use crate::document::DocumentOrder;
use crate::errors::CopyflowError;
use crate::generation::{ModelSettings, RetryConfig};
use crate::observability::LoggingConfig;
use crate::pipeline::PausePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the upstream API key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Settings for the remote generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Model identifier.
    pub model: String,
    /// Maximum output tokens per stage.
    pub max_tokens: u32,
    /// API base URL.
    pub base_url: String,
    /// Value of the `anthropic-version` header.
    pub api_version: String,
    /// Per-request timeout. Stage calls can take minutes.
    pub request_timeout_secs: u64,
    /// API key. Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let model = ModelSettings::default();
        Self {
            model: model.model,
            max_tokens: model.max_tokens,
            base_url: "https://api.anthropic.com".to_string(),
            api_version: "2023-06-01".to_string(),
            request_timeout_secs: 600,
            api_key: None,
        }
    }
}

impl GenerationConfig {
    /// Returns the model settings applied to each stage request.
    #[must_use]
    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
        }
    }
}

/// Pipeline behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Where Start stops.
    pub pause: PausePolicy,
    /// Section order of the final document.
    pub document_order: DocumentOrder,
    /// Keep-alive interval while a stage call is outstanding.
    pub keepalive_interval_secs: u64,
    /// Buffered frames per progress channel.
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pause: PausePolicy::default(),
            document_order: DocumentOrder::default(),
            keepalive_interval_secs: 15,
            channel_capacity: 64,
        }
    }
}

impl PipelineConfig {
    /// Returns the keep-alive interval, never shorter than one second.
    #[must_use]
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs.max(1))
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `{slug}.md` briefs.
    pub briefs_dir: PathBuf,
    /// Directory receiving final documents.
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            briefs_dir: PathBuf::from("briefs"),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Access tokens accepted by the service. Empty means unauthenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Accepted bearer tokens.
    pub tokens: Vec<String>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Generation service settings.
    pub generation: GenerationConfig,
    /// Retry policy for transient upstream failures.
    pub retry: RetryConfig,
    /// Pipeline behavior.
    pub pipeline: PipelineConfig,
    /// Filesystem locations.
    pub storage: StorageConfig,
    /// Logging.
    pub logging: LoggingConfig,
    /// Authentication.
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, CopyflowError> {
        toml::from_str(text).map_err(|e| CopyflowError::Config(format!("Invalid config: {e}")))
    }

    /// Loads configuration from an optional file, then applies the process
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, CopyflowError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| CopyflowError::persistence(path, e))?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies environment overrides using the given lookup.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(API_KEY_ENV) {
            self.generation.api_key = Some(key);
        }
        if let Some(model) = get("COPYFLOW_MODEL") {
            self.generation.model = model;
        }
        if let Some(dir) = get("COPYFLOW_BRIEFS_DIR") {
            self.storage.briefs_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("COPYFLOW_OUTPUT_DIR") {
            self.storage.output_dir = PathBuf::from(dir);
        }
        if let Some(level) = get("COPYFLOW_LOG_LEVEL") {
            self.logging.level = level;
        }
    }
}
