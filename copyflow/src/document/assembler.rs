//! Final document assembly.

use crate::context::{PipelineContext, StageOutput};
use crate::core::StageId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Section order of the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentOrder {
    /// Analysis, Pain Points, Copy, Strategy.
    StageOrder,
    /// Strategy first, then Analysis, Pain Points, Copy.
    DeliverableFirst,
}

impl Default for DocumentOrder {
    fn default() -> Self {
        Self::StageOrder
    }
}

impl DocumentOrder {
    /// Returns the stages in the order they appear in the document.
    #[must_use]
    pub fn sections(self) -> [StageId; 4] {
        match self {
            Self::StageOrder => StageId::ALL,
            Self::DeliverableFirst => [
                StageId::Strategy,
                StageId::Analysis,
                StageId::PainPoints,
                StageId::Copy,
            ],
        }
    }
}

/// The assembled output of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalDocument {
    client_name: String,
    slug: String,
    date: NaiveDate,
    sections: Vec<StageOutput>,
}

impl FinalDocument {
    /// Assembles a document from a complete context.
    ///
    /// Returns `None` if any stage output is missing.
    #[must_use]
    pub fn from_context(ctx: &PipelineContext, date: NaiveDate) -> Option<Self> {
        if !ctx.is_complete() {
            return None;
        }
        Some(Self {
            client_name: ctx.brief().client_name().to_string(),
            slug: ctx.brief().slug().to_string(),
            date,
            sections: ctx.outputs().to_vec(),
        })
    }

    /// Returns the client name.
    #[must_use]
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Returns the run date.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the output file name, `{YYYY-MM-DD}-{slug}.md`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}-{}.md", self.date.format("%Y-%m-%d"), self.slug)
    }

    fn section(&self, stage: StageId) -> &str {
        self.sections
            .iter()
            .find(|s| s.stage == stage)
            .map_or("", |s| s.text.as_str())
    }

    /// Renders the document as markdown.
    #[must_use]
    pub fn render(&self, order: DocumentOrder) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}", self.client_name);
        let _ = writeln!(out);
        let _ = writeln!(out, "Generated {}", self.date.format("%Y-%m-%d"));

        for stage in order.sections() {
            let _ = writeln!(out);
            let _ = writeln!(out, "## {}", stage.label());
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", self.section(stage).trim_end());
        }
        out
    }
}
