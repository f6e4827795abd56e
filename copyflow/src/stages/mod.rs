//! Stage trait and implementations.
//!
//! Each stage turns the accumulated context into one new text artifact with
//! exactly one generation call. The pipeline treats stages as opaque
//! collaborators: `(context) -> text, may fail`.

pub mod prompts;

use crate::context::PipelineContext;
use crate::core::StageId;
use crate::errors::GenerationError;
use crate::generation::{GenerationRequest, Message, ModelSettings, TextGenerator};
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Trait for pipeline stages.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns which stage this is.
    fn id(&self) -> StageId;

    /// Executes the stage against the accumulated context.
    async fn execute(
        &self,
        ctx: &PipelineContext,
        generator: &dyn TextGenerator,
    ) -> Result<String, GenerationError>;
}

/// A stage backed by a fixed instruction template.
#[derive(Debug, Clone)]
pub struct PromptStage {
    id: StageId,
    settings: ModelSettings,
}

impl PromptStage {
    /// Creates a prompt stage.
    #[must_use]
    pub fn new(id: StageId, settings: ModelSettings) -> Self {
        Self { id, settings }
    }

    /// Builds the single generation request for this stage.
    #[must_use]
    pub fn build_request(&self, ctx: &PipelineContext) -> GenerationRequest {
        GenerationRequest {
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            system: prompts::system_with_guidelines(self.id, ctx.brand_guidelines()),
            messages: vec![Message::user(prompts::user_instruction(self.id, ctx))],
        }
    }
}

#[async_trait]
impl Stage for PromptStage {
    fn id(&self) -> StageId {
        self.id
    }

    async fn execute(
        &self,
        ctx: &PipelineContext,
        generator: &dyn TextGenerator,
    ) -> Result<String, GenerationError> {
        generator.generate(&self.build_request(ctx)).await
    }
}

/// The four stages, held in execution order.
#[derive(Debug, Clone)]
pub struct StageSet {
    stages: [Arc<dyn Stage>; 4],
}

impl StageSet {
    /// Creates the standard template-backed stages.
    #[must_use]
    pub fn standard(settings: &ModelSettings) -> Self {
        Self {
            stages: StageId::ALL
                .map(|id| Arc::new(PromptStage::new(id, settings.clone())) as Arc<dyn Stage>),
        }
    }

    /// Replaces the stage with the same id.
    #[must_use]
    pub fn with_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        let slot = usize::from(stage.id().index() - 1);
        self.stages[slot] = stage;
        self
    }

    /// Returns the stage for an id.
    #[must_use]
    pub fn get(&self, id: StageId) -> &Arc<dyn Stage> {
        &self.stages[usize::from(id.index() - 1)]
    }
}

impl Default for StageSet {
    fn default() -> Self {
        Self::standard(&ModelSettings::default())
    }
}
