//! Core domain model types for copyflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Stage identity
//! - Client briefs and slugs
//! - Pipeline events and progress frames

mod brief;
mod event;
mod stage_id;

pub use brief::{slugify, Brief};
pub use event::{PausedContext, PipelineEvent, ProgressFrame};
pub use stage_id::StageId;
