//! Run state machine.

use crate::core::StageId;
use crate::errors::InvalidTransitionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a single run currently stands.
///
/// ```text
/// Idle -> Running(1) -> StageDone(1) -> Running(2) -> StageDone(2) -> Paused
///                                                               \-> Running(3)
/// Paused -> Running(3) -> StageDone(3) -> Running(4) -> StageDone(4) -> Completed
/// ```
///
/// `Failed` is reachable from every state except `Completed` and itself.
/// `Paused` ends phase one; a resumed run starts from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "stage")]
pub enum RunState {
    /// Nothing has run yet.
    Idle,
    /// A stage call is outstanding.
    Running(StageId),
    /// A stage has produced output.
    StageDone(StageId),
    /// Phase one finished and the context was handed back.
    Paused,
    /// The final document was written.
    Completed,
    /// The run halted.
    Failed,
}

impl Default for RunState {
    fn default() -> Self {
        Self::Idle
    }
}

impl RunState {
    /// Returns true if the transition `self -> to` is legal.
    #[must_use]
    pub fn can_transition(self, to: Self) -> bool {
        match (self, to) {
            (Self::Idle, Self::Running(StageId::Analysis))
            | (Self::Paused, Self::Running(StageId::Copy))
            | (Self::StageDone(StageId::PainPoints), Self::Paused)
            | (Self::StageDone(StageId::Strategy), Self::Completed)
            | (
                Self::Idle | Self::Running(_) | Self::StageDone(_) | Self::Paused,
                Self::Failed,
            ) => true,
            (Self::Running(running), Self::StageDone(done)) => running == done,
            (Self::StageDone(done), Self::Running(next)) => done.next() == Some(next),
            _ => false,
        }
    }

    /// Moves to `to`, rejecting illegal transitions.
    pub fn transition(self, to: Self) -> Result<Self, InvalidTransitionError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(InvalidTransitionError { from: self, to })
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running(stage) => write!(f, "running stage {}", stage.index()),
            Self::StageDone(stage) => write!(f, "stage {} done", stage.index()),
            Self::Paused => write!(f, "paused"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
