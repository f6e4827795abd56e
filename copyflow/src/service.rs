//! Start and Resume as streaming operations.
//!
//! Each call authenticates and validates synchronously, then spawns one task
//! that drives the run and returns the consumer side of its progress
//! channel. Dropping the stream disconnects the run: it stops emitting and
//! starts no further stages.

use crate::auth::{authenticator_from_config, AllowAll, Authenticator};
use crate::config::AppConfig;
use crate::errors::CopyflowError;
use crate::events::{progress_channel, ProgressStream};
use crate::pipeline::{PipelineRunner, ResumeRequest, StartRequest};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default number of buffered frames per run.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Entry point for callers that consume progress as a stream.
#[derive(Debug, Clone)]
pub struct PipelineService {
    runner: Arc<PipelineRunner>,
    authenticator: Arc<dyn Authenticator>,
    channel_capacity: usize,
}

impl PipelineService {
    /// Creates an open service around a runner.
    #[must_use]
    pub fn new(runner: Arc<PipelineRunner>) -> Self {
        Self {
            runner,
            authenticator: Arc::new(AllowAll),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Builds the service, runner and authenticator from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, CopyflowError> {
        let runner = PipelineRunner::from_config(config)?;
        Ok(Self::new(Arc::new(runner))
            .with_authenticator(authenticator_from_config(&config.auth))
            .with_channel_capacity(config.pipeline.channel_capacity))
    }

    /// Sets the authenticator.
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// Sets the per-run channel capacity.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    fn authorize(&self, token: Option<&str>) -> Result<(), CopyflowError> {
        if self.authenticator.validate(token) {
            Ok(())
        } else {
            warn!("Rejected request with invalid access token");
            Err(CopyflowError::Unauthorized)
        }
    }

    /// Starts a run and returns its progress stream.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        &self,
        token: Option<&str>,
        request: StartRequest,
    ) -> Result<ProgressStream, CopyflowError> {
        self.authorize(token)?;
        request.validate()?;

        let (sink, stream) = progress_channel(self.channel_capacity);
        let runner = Arc::clone(&self.runner);
        tokio::spawn(async move {
            if let Err(err) = runner.start(request, &sink).await {
                debug!(kind = err.kind(), "Start run ended with error");
            }
        });
        Ok(stream)
    }

    /// Resumes a run from caller-supplied context and returns its progress
    /// stream.
    ///
    /// Must be called from within a tokio runtime.
    pub fn resume(
        &self,
        token: Option<&str>,
        request: ResumeRequest,
    ) -> Result<ProgressStream, CopyflowError> {
        self.authorize(token)?;
        request.validate()?;

        let (sink, stream) = progress_channel(self.channel_capacity);
        let runner = Arc::clone(&self.runner);
        tokio::spawn(async move {
            if let Err(err) = runner.resume(request, &sink).await {
                debug!(kind = err.kind(), "Resume run ended with error");
            }
        });
        Ok(stream)
    }
}
