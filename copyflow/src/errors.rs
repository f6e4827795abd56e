//! Error types for copyflow.
//!
//! The taxonomy separates upstream generation failures (transient and
//! permanent), input validation, persistence, and transport problems.
//! Generation errors are kept apart from pipeline errors so the retrying
//! client can be used and tested on its own.

use crate::core::StageId;
use crate::pipeline::RunState;
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Message surfaced once transient upstream failures exhaust the retry budget.
pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "The generation service is currently overloaded. Please try again in a few minutes.";

/// HTTP status used by the upstream service to signal overload.
pub const OVERLOADED_STATUS: u16 = 529;

/// The main error type for copyflow operations.
#[derive(Debug, Error)]
pub enum CopyflowError {
    /// A request was missing a required field.
    #[error("{0}")]
    InvalidInput(#[from] InvalidInputError),

    /// A stage's generation call failed.
    #[error("{stage} stage failed: {source}")]
    Stage {
        /// The stage that failed.
        stage: StageId,
        /// The underlying generation failure.
        #[source]
        source: GenerationError,
    },

    /// A file or directory could not be written or read.
    #[error("Persistence error at {}: {source}", path.display())]
    Persistence {
        /// The path being written or read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The caller's access token was rejected.
    #[error("Unauthorized: invalid or missing access token")]
    Unauthorized,

    /// The progress consumer went away before the run finished.
    #[error("Progress consumer disconnected")]
    Disconnected,

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The runner attempted an illegal state transition.
    #[error("{0}")]
    InvalidTransition(#[from] InvalidTransitionError),
}

impl CopyflowError {
    /// Creates a persistence error for the given path.
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Returns a stable, machine-readable name for the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "InvalidInput",
            Self::Stage {
                source: GenerationError::ServiceUnavailable { .. },
                ..
            } => "ServiceUnavailable",
            Self::Stage { .. } => "UpstreamError",
            Self::Persistence { .. } => "PersistenceFailure",
            Self::Unauthorized => "Unauthorized",
            Self::Disconnected => "Disconnected",
            Self::Config(_) => "ConfigError",
            Self::InvalidTransition(_) => "InvalidTransition",
        }
    }

    /// Converts to a structured response body.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), json!(self.kind()));
        map.insert("message".to_string(), json!(self.to_string()));

        match self {
            Self::InvalidInput(err) => {
                map.insert("field".to_string(), json!(err.field));
            }
            Self::Stage { stage, .. } => {
                map.insert("stage".to_string(), json!(stage.index()));
            }
            Self::Persistence { path, .. } => {
                map.insert("path".to_string(), json!(path.display().to_string()));
            }
            _ => {}
        }

        map
    }
}

/// Error raised when a Start or Resume request fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid input: '{field}' {message}")]
pub struct InvalidInputError {
    /// The offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl InvalidInputError {
    /// Creates a new invalid input error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates the error for a required field that is missing or blank.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "is required")
    }
}

/// Error raised when the run state machine is driven out of order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid run state transition: {from} -> {to}")]
pub struct InvalidTransitionError {
    /// State the run was in.
    pub from: RunState,
    /// State that was requested.
    pub to: RunState,
}

/// Failure of a single generation request, after any retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Transient overload persisted through every attempt.
    #[error("{message}")]
    ServiceUnavailable {
        /// Human-readable message, distinct from the raw upstream error.
        message: String,
        /// Number of attempts made.
        attempts: usize,
    },

    /// A permanent upstream failure, propagated unchanged.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl GenerationError {
    /// Creates the error for an exhausted retry budget.
    #[must_use]
    pub fn service_unavailable(attempts: usize) -> Self {
        Self::ServiceUnavailable {
            message: SERVICE_UNAVAILABLE_MESSAGE.to_string(),
            attempts,
        }
    }
}

/// A raw failure reported by the remote text-generation service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct UpstreamError {
    /// HTTP status, when the failure came from a response.
    pub status: Option<u16>,
    /// The upstream message.
    pub message: String,
}

impl UpstreamError {
    /// Creates a new upstream error.
    #[must_use]
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates an upstream error with an HTTP status.
    #[must_use]
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(Some(status), message)
    }

    /// Returns true if this failure signals a temporary overload.
    ///
    /// Matches either the dedicated status code or the word "overloaded"
    /// anywhere in the message.
    #[must_use]
    pub fn is_overloaded(&self) -> bool {
        self.status == Some(OVERLOADED_STATUS)
            || self.message.to_ascii_lowercase().contains("overloaded")
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "Upstream error (status {status}): {}", self.message),
            None => write!(f, "Upstream error: {}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overload_detected_by_status() {
        assert!(UpstreamError::with_status(529, "busy").is_overloaded());
        assert!(!UpstreamError::with_status(500, "internal").is_overloaded());
    }

    #[test]
    fn test_overload_detected_by_message() {
        let err = UpstreamError::new(None, "{\"type\":\"overloaded_error\"}");
        assert!(err.is_overloaded());

        let err = UpstreamError::with_status(503, "Service Overloaded");
        assert!(err.is_overloaded());
    }

    #[test]
    fn test_auth_error_not_overloaded() {
        let err = UpstreamError::with_status(401, "invalid x-api-key");
        assert!(!err.is_overloaded());
    }

    #[test]
    fn test_service_unavailable_message_hides_upstream_payload() {
        let err = GenerationError::service_unavailable(5);
        assert_eq!(err.to_string(), SERVICE_UNAVAILABLE_MESSAGE);
        assert!(!err.to_string().contains("529"));
    }

    #[test]
    fn test_upstream_display() {
        let err = UpstreamError::with_status(400, "bad request");
        assert_eq!(err.to_string(), "Upstream error (status 400): bad request");

        let err = UpstreamError::new(None, "connection reset");
        assert_eq!(err.to_string(), "Upstream error: connection reset");
    }

    #[test]
    fn test_invalid_input_to_dict() {
        let err = CopyflowError::from(InvalidInputError::missing("brief"));
        let dict = err.to_dict();

        assert_eq!(dict.get("type").unwrap(), "InvalidInput");
        assert_eq!(dict.get("field").unwrap(), "brief");
        assert!(dict.get("message").unwrap().as_str().unwrap().contains("brief"));
    }

    #[test]
    fn test_stage_error_kind() {
        let err = CopyflowError::Stage {
            stage: StageId::Analysis,
            source: GenerationError::service_unavailable(3),
        };
        assert_eq!(err.kind(), "ServiceUnavailable");
        assert_eq!(err.to_dict().get("stage").unwrap(), 1);

        let err = CopyflowError::Stage {
            stage: StageId::Copy,
            source: UpstreamError::with_status(400, "bad").into(),
        };
        assert_eq!(err.kind(), "UpstreamError");
        assert!(err.to_string().starts_with("Copy stage failed"));
    }
}
