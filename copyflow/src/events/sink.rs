//! Event sink trait and implementations.

use crate::core::{PipelineEvent, ProgressFrame};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn, Level};

/// Receives the progress of one pipeline run.
///
/// The runner emits events in program order and awaits each `emit` before
/// continuing, so a sink sees them in exactly that order. A sink serves at
/// most one run.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers a pipeline event.
    ///
    /// Delivery failures are the sink's concern; this never fails.
    async fn emit(&self, event: PipelineEvent);

    /// Signals liveness while a long stage call is outstanding.
    ///
    /// Must not block. Sinks without an idle-sensitive transport ignore it.
    fn keepalive(&self) {}

    /// Returns true once the consumer has gone away.
    fn is_closed(&self) -> bool {
        false
    }
}

/// A no-op event sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: PipelineEvent) {
        // Intentionally empty - discards all events
    }
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log_event(&self, event: &PipelineEvent) {
        // Stage output can be long; log its size rather than its text.
        let (stage, output_len) = match event {
            PipelineEvent::Completed { stage, output, .. } => (Some(*stage), Some(output.len())),
            other => (other.stage(), None),
        };

        match event {
            PipelineEvent::Failed { error } => {
                warn!(event_type = event.event_type(), error = %error, "Pipeline failed");
            }
            PipelineEvent::Done { output_path } => {
                info!(event_type = event.event_type(), output_path = %output_path, "Pipeline done");
            }
            _ if self.level == Level::DEBUG => {
                debug!(event_type = event.event_type(), ?stage, ?output_len, "Event: {}", event.event_type());
            }
            _ => {
                info!(event_type = event.event_type(), ?stage, ?output_len, "Event: {}", event.event_type());
            }
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: PipelineEvent) {
        self.log_event(&event);
    }
}

/// A collecting event sink for testing purposes.
///
/// Records every frame, including keep-alives. It can be told to report
/// itself closed after a number of events to simulate a client disconnect.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    frames: RwLock<Vec<ProgressFrame>>,
    close_after: Option<usize>,
    closed: AtomicBool,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that reports closed once `events` events have arrived.
    #[must_use]
    pub fn closing_after(events: usize) -> Self {
        Self {
            close_after: Some(events),
            ..Self::default()
        }
    }

    /// Marks the sink closed.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Returns all collected pipeline events, without keep-alives.
    #[must_use]
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.frames
            .read()
            .iter()
            .filter_map(ProgressFrame::as_event)
            .cloned()
            .collect()
    }

    /// Returns the type tags of collected events, in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events().iter().map(PipelineEvent::event_type).collect()
    }

    /// Returns the number of keep-alives received.
    #[must_use]
    pub fn keepalive_count(&self) -> usize {
        self.frames
            .read()
            .iter()
            .filter(|f| matches!(f, ProgressFrame::KeepAlive))
            .count()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: PipelineEvent) {
        let count = {
            let mut frames = self.frames.write();
            frames.push(ProgressFrame::Event(event));
            frames.iter().filter(|f| f.as_event().is_some()).count()
        };
        if self.close_after.is_some_and(|limit| count >= limit) {
            self.close();
        }
    }

    fn keepalive(&self) {
        self.frames.write().push(ProgressFrame::KeepAlive);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
