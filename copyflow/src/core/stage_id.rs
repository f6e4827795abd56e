//! Stage identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    /// Stage 1: brief analysis.
    Analysis,
    /// Stage 2: pain point expansion.
    PainPoints,
    /// Stage 3: copy generation.
    Copy,
    /// Stage 4: strategy synthesis.
    Strategy,
}

impl StageId {
    /// All stages in execution order.
    pub const ALL: [Self; 4] = [Self::Analysis, Self::PainPoints, Self::Copy, Self::Strategy];

    /// Returns the 1-based stage index.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Analysis => 1,
            Self::PainPoints => 2,
            Self::Copy => 3,
            Self::Strategy => 4,
        }
    }

    /// Looks up a stage by its 1-based index.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Self::Analysis),
            2 => Some(Self::PainPoints),
            3 => Some(Self::Copy),
            4 => Some(Self::Strategy),
            _ => None,
        }
    }

    /// Returns the human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Analysis => "Analysis",
            Self::PainPoints => "Pain Points",
            Self::Copy => "Copy",
            Self::Strategy => "Strategy",
        }
    }

    /// Returns the stage that follows this one.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
