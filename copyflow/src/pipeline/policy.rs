//! Pause policy.

use crate::core::StageId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a Start run stops for human review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PausePolicy {
    /// Stop after stage 2 and hand the context back.
    AfterPainPoints,
    /// Run all four stages in one go.
    Never,
}

impl Default for PausePolicy {
    fn default() -> Self {
        Self::AfterPainPoints
    }
}

impl PausePolicy {
    /// Returns the stage after which a Start run pauses, if any.
    #[must_use]
    pub fn pause_after(self) -> Option<StageId> {
        match self {
            Self::AfterPainPoints => Some(StageId::PainPoints),
            Self::Never => None,
        }
    }

    /// Returns true if the run pauses once `stage` completes.
    #[must_use]
    pub fn pauses_after(self, stage: StageId) -> bool {
        self.pause_after() == Some(stage)
    }
}

impl fmt::Display for PausePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AfterPainPoints => write!(f, "after_pain_points"),
            Self::Never => write!(f, "never"),
        }
    }
}
