//! Pipeline execution.
//!
//! This module provides:
//! - The run state machine
//! - Pause policy
//! - Start and Resume requests with validation
//! - The two-phase runner

mod policy;
mod request;
mod runner;
mod state;

#[cfg(test)]
mod integration_tests;

pub use policy::PausePolicy;
pub use request::{ResumeRequest, StartRequest};
pub use runner::{PipelineRunner, RunOutcome};
pub use state::RunState;
