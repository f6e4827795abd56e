//! Testing utilities for copyflow pipelines.
//!
//! This module provides:
//! - A scripted generator with a call counter
//! - Re-export of the collecting event sink

mod mocks;

pub use crate::events::CollectingEventSink;
pub use mocks::ScriptedGenerator;
