//! Pipeline lifecycle events and progress frames.

use super::StageId;
use serde::{Deserialize, Serialize};

/// Everything a caller needs to review and resume a paused run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PausedContext {
    /// The client name the run was started with.
    pub client_name: String,
    /// The original brief text.
    pub brief: String,
    /// Stage 1 output.
    pub analysis: String,
    /// Stage 2 output.
    pub pain_points: String,
    /// Brand guidelines, if any were supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_guidelines: Option<String>,
}

/// A lifecycle event emitted by the pipeline runner.
///
/// Events are emitted in program order. `Paused`, `Done` and `Failed` are
/// terminal: nothing follows them within the same run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// A stage has begun.
    Started {
        /// 1-based stage index.
        stage: u8,
        /// Stage label.
        label: String,
    },
    /// A stage finished and produced output.
    Completed {
        /// 1-based stage index.
        stage: u8,
        /// Stage label.
        label: String,
        /// The stage's generated text.
        output: String,
    },
    /// Phase one finished; the context is handed back for review.
    Paused {
        /// The context to edit and resume with.
        context: PausedContext,
    },
    /// The final document has been written.
    Done {
        /// Where the document was written.
        output_path: String,
    },
    /// The run halted.
    Failed {
        /// Human-readable error message.
        error: String,
    },
}

impl PipelineEvent {
    /// Creates a `started` event.
    #[must_use]
    pub fn started(stage: StageId) -> Self {
        Self::Started {
            stage: stage.index(),
            label: stage.label().to_string(),
        }
    }

    /// Creates a `completed` event.
    #[must_use]
    pub fn completed(stage: StageId, output: impl Into<String>) -> Self {
        Self::Completed {
            stage: stage.index(),
            label: stage.label().to_string(),
            output: output.into(),
        }
    }

    /// Creates a `failed` event.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    /// Returns the event's type tag.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Completed { .. } => "completed",
            Self::Paused { .. } => "paused",
            Self::Done { .. } => "done",
            Self::Failed { .. } => "failed",
        }
    }

    /// Returns the stage index for stage-scoped events.
    #[must_use]
    pub fn stage(&self) -> Option<u8> {
        match self {
            Self::Started { stage, .. } | Self::Completed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Returns true if no further events follow this one.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paused { .. } | Self::Done { .. } | Self::Failed { .. })
    }
}

/// One unit on the progress transport.
///
/// Keep-alives carry no pipeline meaning; they only keep intermediaries from
/// treating a connection as idle during long stage calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressFrame {
    /// A pipeline event.
    Event(PipelineEvent),
    /// A transport keep-alive.
    KeepAlive,
}

impl ProgressFrame {
    /// Encodes the frame as a server-sent-events chunk.
    ///
    /// Events become `data:` lines; keep-alives become SSE comments, which
    /// clients ignore.
    #[must_use]
    pub fn to_sse(&self) -> String {
        match self {
            Self::Event(event) => match serde_json::to_string(event) {
                Ok(json) => format!("data: {json}\n\n"),
                Err(err) => failure_sse(&err.to_string()),
            },
            Self::KeepAlive => ": keepalive\n\n".to_string(),
        }
    }

    /// Returns the event, if this frame carries one.
    #[must_use]
    pub fn as_event(&self) -> Option<&PipelineEvent> {
        match self {
            Self::Event(event) => Some(event),
            Self::KeepAlive => None,
        }
    }
}

fn failure_sse(message: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({"type": "failed", "error": message})
    )
}

impl From<PipelineEvent> for ProgressFrame {
    fn from(event: PipelineEvent) -> Self {
        Self::Event(event)
    }
}
