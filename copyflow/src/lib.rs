//! # Copyflow
//!
//! A resumable four-stage content generation pipeline.
//!
//! A client brief passes through four ordered stages, each one remote text
//! generation call over the accumulated context:
//!
//! - **Analysis**: industry, audience, pain points, differentiators
//! - **Pain Points**: one expanded entry per pain point
//! - **Copy**: headline, social post and email opener per pain point
//! - **Strategy**: key messages, channel plan, next steps
//!
//! Runs are two-phase. Start runs stages 1 and 2 and pauses with the context
//! handed back; Resume takes that context, possibly edited, runs stages 3
//! and 4, and writes the final document. Progress is streamed as typed
//! events with keep-alives during long calls, and transient upstream
//! overload is retried with exponential backoff.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use copyflow::prelude::*;
//!
//! let config = AppConfig::load(None)?;
//! let service = PipelineService::from_config(&config)?;
//!
//! let mut stream = service.start(None, StartRequest::new("Acme Corp", brief))?;
//! while let Some(frame) = stream.recv().await {
//!     print!("{}", frame.to_sse());
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod auth;
pub mod config;
pub mod context;
pub mod core;
pub mod document;
pub mod errors;
pub mod events;
pub mod generation;
pub mod observability;
pub mod pipeline;
pub mod service;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::auth::{AllowAll, Authenticator, StaticTokens};
    pub use crate::config::AppConfig;
    pub use crate::context::{PipelineContext, StageOutput};
    pub use crate::core::{slugify, Brief, PausedContext, PipelineEvent, ProgressFrame, StageId};
    pub use crate::document::{DocumentOrder, DocumentStore, FinalDocument};
    pub use crate::errors::{CopyflowError, GenerationError, InvalidInputError, UpstreamError};
    pub use crate::events::{
        progress_channel, ChannelEventSink, EventSink, LoggingEventSink, NoOpEventSink,
        ProgressStream,
    };
    pub use crate::generation::{
        AnthropicTransport, GenerationRequest, ModelTransport, RetryConfig, RetryingGenerator,
        TextGenerator,
    };
    pub use crate::observability::init_logging;
    pub use crate::pipeline::{
        PausePolicy, PipelineRunner, ResumeRequest, RunOutcome, RunState, StartRequest,
    };
    pub use crate::service::PipelineService;
    pub use crate::stages::{PromptStage, Stage, StageSet};
}
