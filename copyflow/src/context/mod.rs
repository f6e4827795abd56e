//! Context accumulated over one pipeline run.
//!
//! A [`PipelineContext`] starts with the brief and optional brand guidelines
//! and grows by one [`StageOutput`] per completed stage. It never shrinks and
//! never accepts a stage whose predecessor is missing.

use crate::core::{Brief, PausedContext, StageId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Text produced by one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutput {
    /// Which stage produced it.
    pub stage: StageId,
    /// The generated text.
    pub text: String,
}

/// Error raised when an output is appended out of order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot record {stage} output: expected {expected}")]
pub struct OutOfOrderError {
    /// The stage whose output was offered.
    pub stage: StageId,
    /// What the context expected next.
    pub expected: String,
}

/// The brief plus every stage output produced so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineContext {
    brief: Brief,
    brand_guidelines: Option<String>,
    outputs: Vec<StageOutput>,
}

impl PipelineContext {
    /// Creates an empty context for a brief.
    #[must_use]
    pub fn new(brief: Brief) -> Self {
        Self {
            brief,
            brand_guidelines: None,
            outputs: Vec::new(),
        }
    }

    /// Creates a context that already holds the analysis and pain points.
    ///
    /// Used to resume a run from caller-supplied, possibly edited, text.
    #[must_use]
    pub fn with_phase_one(
        brief: Brief,
        analysis: impl Into<String>,
        pain_points: impl Into<String>,
    ) -> Self {
        Self {
            brief,
            brand_guidelines: None,
            outputs: vec![
                StageOutput {
                    stage: StageId::Analysis,
                    text: analysis.into(),
                },
                StageOutput {
                    stage: StageId::PainPoints,
                    text: pain_points.into(),
                },
            ],
        }
    }

    /// Sets the brand guidelines. Blank guidelines are treated as absent.
    #[must_use]
    pub fn with_brand_guidelines(mut self, guidelines: Option<String>) -> Self {
        self.brand_guidelines = guidelines.filter(|g| !g.trim().is_empty());
        self
    }

    /// Returns the brief.
    #[must_use]
    pub fn brief(&self) -> &Brief {
        &self.brief
    }

    /// Returns the brand guidelines, if any.
    #[must_use]
    pub fn brand_guidelines(&self) -> Option<&str> {
        self.brand_guidelines.as_deref()
    }

    /// Returns all outputs in stage order.
    #[must_use]
    pub fn outputs(&self) -> &[StageOutput] {
        &self.outputs
    }

    /// Returns the output for a stage, if it has been produced.
    #[must_use]
    pub fn output(&self, stage: StageId) -> Option<&str> {
        self.outputs
            .iter()
            .find(|o| o.stage == stage)
            .map(|o| o.text.as_str())
    }

    /// Returns the stage whose output is needed next.
    #[must_use]
    pub fn next_stage(&self) -> Option<StageId> {
        match self.outputs.last() {
            None => Some(StageId::Analysis),
            Some(last) => last.stage.next(),
        }
    }

    /// Returns true once all four stages have produced output.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.next_stage().is_none()
    }

    /// Appends a stage's output.
    ///
    /// Only the stage returned by [`next_stage`](Self::next_stage) is accepted.
    pub fn record(&mut self, stage: StageId, text: impl Into<String>) -> Result<(), OutOfOrderError> {
        match self.next_stage() {
            Some(expected) if expected == stage => {
                self.outputs.push(StageOutput {
                    stage,
                    text: text.into(),
                });
                Ok(())
            }
            Some(expected) => Err(OutOfOrderError {
                stage,
                expected: expected.to_string(),
            }),
            None => Err(OutOfOrderError {
                stage,
                expected: "no further stages".to_string(),
            }),
        }
    }

    /// Snapshots the context for a `paused` event.
    ///
    /// Returns `None` until both analysis and pain points exist.
    #[must_use]
    pub fn to_paused(&self) -> Option<PausedContext> {
        Some(PausedContext {
            client_name: self.brief.client_name().to_string(),
            brief: self.brief.text().to_string(),
            analysis: self.output(StageId::Analysis)?.to_string(),
            pain_points: self.output(StageId::PainPoints)?.to_string(),
            brand_guidelines: self.brand_guidelines.clone(),
        })
    }
}
