//! Two-phase pipeline runner.

use super::{PausePolicy, ResumeRequest, RunState, StartRequest};
use crate::config::AppConfig;
use crate::context::PipelineContext;
use crate::core::{PausedContext, PipelineEvent, StageId};
use crate::document::{DocumentOrder, DocumentStore, FinalDocument};
use crate::errors::{CopyflowError, InvalidTransitionError};
use crate::events::{with_keepalive, EventSink};
use crate::generation::{AnthropicTransport, RetryingGenerator, TextGenerator};
use crate::observability::SpanTimer;
use crate::stages::StageSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// How a run ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Phase one finished; the context was handed back for review.
    Paused(PausedContext),
    /// The final document was written.
    Completed {
        /// Where the document was written.
        path: PathBuf,
    },
}

/// State owned by exactly one run.
struct Run<'a> {
    id: Uuid,
    state: RunState,
    ctx: PipelineContext,
    sink: &'a dyn EventSink,
}

impl<'a> Run<'a> {
    fn new(state: RunState, ctx: PipelineContext, sink: &'a dyn EventSink) -> Self {
        Self {
            id: Uuid::new_v4(),
            state,
            ctx,
            sink,
        }
    }

    fn advance(&mut self, to: RunState) -> Result<(), InvalidTransitionError> {
        self.state = self.state.transition(to)?;
        Ok(())
    }

    fn ensure_connected(&self) -> Result<(), CopyflowError> {
        if self.sink.is_closed() {
            return Err(CopyflowError::Disconnected);
        }
        Ok(())
    }

    async fn emit(&self, event: PipelineEvent) {
        if self.sink.is_closed() {
            debug!(event_type = event.event_type(), "Sink closed, event not emitted");
            return;
        }
        self.sink.emit(event).await;
    }

    async fn settle(
        &mut self,
        result: Result<RunOutcome, CopyflowError>,
    ) -> Result<RunOutcome, CopyflowError> {
        if let Err(err) = &result {
            self.fail(err).await;
        }
        result
    }

    async fn pause(&mut self) -> Result<RunOutcome, CopyflowError> {
        let context = self.ctx.to_paused().ok_or(InvalidTransitionError {
            from: self.state,
            to: RunState::Paused,
        })?;
        self.advance(RunState::Paused)?;
        self.emit(PipelineEvent::Paused {
            context: context.clone(),
        })
        .await;

        info!("Pipeline paused for review");
        Ok(RunOutcome::Paused(context))
    }

    /// Emits the single `failed` event of a run and marks it failed.
    async fn fail(&mut self, err: &CopyflowError) {
        if self.state.can_transition(RunState::Failed) {
            self.state = RunState::Failed;
        }
        match err {
            CopyflowError::Disconnected => {
                warn!(state = %self.state, "Progress consumer disconnected, run abandoned");
            }
            _ => {
                warn!(error = %err, kind = err.kind(), "Pipeline run failed");
                self.emit(PipelineEvent::failed(err.to_string())).await;
            }
        }
    }
}

/// Runs the four stages in order, pausing per policy.
///
/// The runner holds no per-run state: every call to [`start`](Self::start)
/// or [`resume`](Self::resume) builds its own context, so concurrent runs
/// share nothing but the output directory.
pub struct PipelineRunner {
    generator: Arc<dyn TextGenerator>,
    stages: StageSet,
    store: DocumentStore,
    pause: PausePolicy,
    order: DocumentOrder,
    keepalive_interval: Duration,
}

impl fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("stages", &self.stages)
            .field("store", &self.store)
            .field("pause", &self.pause)
            .field("order", &self.order)
            .field("keepalive_interval", &self.keepalive_interval)
            .finish_non_exhaustive()
    }
}

impl PipelineRunner {
    /// Creates a runner with the standard stages and default policies.
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>, store: DocumentStore) -> Self {
        Self {
            generator,
            stages: StageSet::default(),
            store,
            pause: PausePolicy::default(),
            order: DocumentOrder::default(),
            keepalive_interval: Duration::from_secs(15),
        }
    }

    /// Builds a runner backed by the Anthropic API from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, CopyflowError> {
        let transport = AnthropicTransport::from_config(&config.generation)?;
        let generator = RetryingGenerator::new(transport, config.retry.clone());

        Ok(Self::new(Arc::new(generator), DocumentStore::from_config(&config.storage))
            .with_stages(StageSet::standard(&config.generation.model_settings()))
            .with_pause_policy(config.pipeline.pause)
            .with_document_order(config.pipeline.document_order)
            .with_keepalive_interval(config.pipeline.keepalive_interval()))
    }

    /// Replaces the stage set.
    #[must_use]
    pub fn with_stages(mut self, stages: StageSet) -> Self {
        self.stages = stages;
        self
    }

    /// Sets where Start pauses.
    #[must_use]
    pub fn with_pause_policy(mut self, pause: PausePolicy) -> Self {
        self.pause = pause;
        self
    }

    /// Sets the final document's section order.
    #[must_use]
    pub fn with_document_order(mut self, order: DocumentOrder) -> Self {
        self.order = order;
        self
    }

    /// Sets the keep-alive interval used while a stage call is outstanding.
    #[must_use]
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Returns the document store.
    #[must_use]
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Runs phase one: validates, writes the brief, runs stages 1 and 2,
    /// then pauses. With [`PausePolicy::Never`] it runs to completion.
    ///
    /// Invalid input is rejected before any event, file write or remote call.
    pub async fn start(
        &self,
        request: StartRequest,
        sink: &dyn EventSink,
    ) -> Result<RunOutcome, CopyflowError> {
        request.validate()?;

        let mut run = Run::new(RunState::Idle, request.to_context(), sink);
        let span = info_span!(
            "pipeline_run",
            run_id = %run.id,
            client = %run.ctx.brief().slug(),
            phase = "start"
        );

        let result = async {
            info!(pause = %self.pause, "Pipeline run started");
            self.store.write_brief(run.ctx.brief()).await?;
            self.drive(&mut run).await
        }
        .instrument(span.clone())
        .await;

        run.settle(result).instrument(span).await
    }

    /// Runs phase two from caller-supplied context: stages 3 and 4, then
    /// assembles and writes the final document.
    ///
    /// Invalid input is rejected before any event, file write or remote call.
    pub async fn resume(
        &self,
        request: ResumeRequest,
        sink: &dyn EventSink,
    ) -> Result<RunOutcome, CopyflowError> {
        request.validate()?;

        let mut run = Run::new(RunState::Paused, request.to_context(), sink);
        let span = info_span!(
            "pipeline_run",
            run_id = %run.id,
            client = %run.ctx.brief().slug(),
            phase = "resume"
        );

        let result = async {
            info!("Pipeline run resumed");
            self.drive(&mut run).await
        }
        .instrument(span.clone())
        .await;

        run.settle(result).instrument(span).await
    }

    async fn drive(&self, run: &mut Run<'_>) -> Result<RunOutcome, CopyflowError> {
        while let Some(stage) = run.ctx.next_stage() {
            self.run_stage(run, stage).await?;
            if self.pause.pauses_after(stage) {
                return run.pause().await;
            }
        }
        self.complete(run).await
    }

    async fn run_stage(&self, run: &mut Run<'_>, stage: StageId) -> Result<(), CopyflowError> {
        run.ensure_connected()?;
        run.advance(RunState::Running(stage))?;
        run.emit(PipelineEvent::started(stage)).await;

        let timer = SpanTimer::start();
        let call = self
            .stages
            .get(stage)
            .execute(&run.ctx, self.generator.as_ref());
        let text = with_keepalive(run.sink, self.keepalive_interval, call)
            .await
            .map_err(|source| CopyflowError::Stage { stage, source })?;

        info!(
            stage = stage.index(),
            label = stage.label(),
            duration_ms = timer.finish(),
            output_len = text.len(),
            "Stage completed"
        );

        let done = RunState::StageDone(stage);
        run.ctx
            .record(stage, text.clone())
            .map_err(|_| InvalidTransitionError {
                from: run.state,
                to: done,
            })?;
        run.advance(done)?;
        run.emit(PipelineEvent::completed(stage, text)).await;
        Ok(())
    }

    async fn complete(&self, run: &mut Run<'_>) -> Result<RunOutcome, CopyflowError> {
        let today = chrono::Local::now().date_naive();
        let document = FinalDocument::from_context(&run.ctx, today).ok_or(
            InvalidTransitionError {
                from: run.state,
                to: RunState::Completed,
            },
        )?;

        let path = self.store.write_document(&document, self.order).await?;
        run.advance(RunState::Completed)?;
        run.emit(PipelineEvent::Done {
            output_path: path.display().to_string(),
        })
        .await;

        info!(path = %path.display(), "Pipeline completed");
        Ok(RunOutcome::Completed { path })
    }
}
