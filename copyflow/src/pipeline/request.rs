//! Start and Resume requests.
//!
//! Both are validated before any file is written or any remote call is made.
//! Resume carries the full phase-one context explicitly, so it works across
//! process restarts and accepts caller edits.

use crate::context::PipelineContext;
use crate::core::{slugify, Brief, PausedContext};
use crate::errors::InvalidInputError;
use serde::{Deserialize, Serialize};

fn require(field: &str, value: &str) -> Result<(), InvalidInputError> {
    if value.trim().is_empty() {
        Err(InvalidInputError::missing(field))
    } else {
        Ok(())
    }
}

fn require_client_name(client_name: &str) -> Result<(), InvalidInputError> {
    require("client_name", client_name)?;
    if slugify(client_name).is_empty() {
        return Err(InvalidInputError::new(
            "client_name",
            "must contain at least one letter or digit",
        ));
    }
    Ok(())
}

/// Input to the Start operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    /// Client name; its slug keys the brief and output files.
    pub client_name: String,
    /// Brief text.
    pub brief: String,
    /// Optional brand guidelines, passed verbatim to every stage.
    #[serde(default)]
    pub brand_guidelines: Option<String>,
}

impl StartRequest {
    /// Creates a start request.
    #[must_use]
    pub fn new(client_name: impl Into<String>, brief: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            brief: brief.into(),
            brand_guidelines: None,
        }
    }

    /// Sets brand guidelines.
    #[must_use]
    pub fn with_brand_guidelines(mut self, guidelines: impl Into<String>) -> Self {
        self.brand_guidelines = Some(guidelines.into());
        self
    }

    /// Checks that every required field is present.
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        require_client_name(&self.client_name)?;
        require("brief", &self.brief)
    }

    /// Builds the empty context for a run.
    #[must_use]
    pub fn to_context(&self) -> PipelineContext {
        PipelineContext::new(Brief::new(&self.client_name, &self.brief))
            .with_brand_guidelines(self.brand_guidelines.clone())
    }
}

/// Input to the Resume operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeRequest {
    /// Client name the run was started with.
    pub client_name: String,
    /// Brief text.
    pub brief: String,
    /// Stage 1 output, possibly edited.
    pub analysis: String,
    /// Stage 2 output, possibly edited.
    pub pain_points: String,
    /// Optional brand guidelines.
    #[serde(default)]
    pub brand_guidelines: Option<String>,
}

impl ResumeRequest {
    /// Creates a resume request.
    #[must_use]
    pub fn new(
        client_name: impl Into<String>,
        brief: impl Into<String>,
        analysis: impl Into<String>,
        pain_points: impl Into<String>,
    ) -> Self {
        Self {
            client_name: client_name.into(),
            brief: brief.into(),
            analysis: analysis.into(),
            pain_points: pain_points.into(),
            brand_guidelines: None,
        }
    }

    /// Sets brand guidelines.
    #[must_use]
    pub fn with_brand_guidelines(mut self, guidelines: impl Into<String>) -> Self {
        self.brand_guidelines = Some(guidelines.into());
        self
    }

    /// Replaces the pain points, as a reviewer would before resuming.
    #[must_use]
    pub fn with_pain_points(mut self, pain_points: impl Into<String>) -> Self {
        self.pain_points = pain_points.into();
        self
    }

    /// Checks that every required field is present.
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        require_client_name(&self.client_name)?;
        require("brief", &self.brief)?;
        require("analysis", &self.analysis)?;
        require("pain_points", &self.pain_points)
    }

    /// Rebuilds the phase-one context from the request.
    #[must_use]
    pub fn to_context(&self) -> PipelineContext {
        PipelineContext::with_phase_one(
            Brief::new(&self.client_name, &self.brief),
            &self.analysis,
            &self.pain_points,
        )
        .with_brand_guidelines(self.brand_guidelines.clone())
    }
}

impl From<PausedContext> for ResumeRequest {
    fn from(paused: PausedContext) -> Self {
        Self {
            client_name: paused.client_name,
            brief: paused.brief,
            analysis: paused.analysis,
            pain_points: paused.pain_points,
            brand_guidelines: paused.brand_guidelines,
        }
    }
}
