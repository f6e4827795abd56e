//! Channel-backed event sink and its consumer stream.

use super::EventSink;
use crate::core::{PipelineEvent, ProgressFrame};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;

/// Delivery counters for one channel.
#[derive(Debug, Default)]
pub struct ChannelMetrics {
    events_sent: AtomicU64,
    events_dropped: AtomicU64,
    keepalives_sent: AtomicU64,
    keepalives_skipped: AtomicU64,
}

impl ChannelMetrics {
    /// Returns the number of events handed to the consumer.
    #[must_use]
    pub fn events_sent(&self) -> u64 {
        self.events_sent.load(Ordering::Relaxed)
    }

    /// Returns the number of events lost because the consumer had gone.
    #[must_use]
    pub fn events_dropped(&self) -> u64 {
        self.events_dropped.load(Ordering::Relaxed)
    }

    /// Returns the number of keep-alives queued.
    #[must_use]
    pub fn keepalives_sent(&self) -> u64 {
        self.keepalives_sent.load(Ordering::Relaxed)
    }

    /// Returns the number of keep-alives skipped because the buffer was full.
    #[must_use]
    pub fn keepalives_skipped(&self) -> u64 {
        self.keepalives_skipped.load(Ordering::Relaxed)
    }

    /// Converts metrics to a dictionary.
    #[must_use]
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::json!({
            "events_sent": self.events_sent(),
            "events_dropped": self.events_dropped(),
            "keepalives_sent": self.keepalives_sent(),
            "keepalives_skipped": self.keepalives_skipped(),
        })
    }
}

/// Creates a bounded progress channel.
///
/// The sink side goes to the runner; the stream side goes to the single
/// consumer of the run. A capacity of zero is raised to one.
#[must_use]
pub fn progress_channel(capacity: usize) -> (ChannelEventSink, ProgressStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let metrics = Arc::new(ChannelMetrics::default());
    (
        ChannelEventSink {
            tx,
            metrics: Arc::clone(&metrics),
        },
        ProgressStream { rx, metrics },
    )
}

/// An event sink that forwards frames over a bounded tokio channel.
///
/// `emit` waits for buffer space, so events are never dropped while the
/// consumer is alive. Keep-alives never wait: a full buffer already means
/// the connection is not idle.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::Sender<ProgressFrame>,
    metrics: Arc<ChannelMetrics>,
}

impl ChannelEventSink {
    /// Returns the delivery counters shared with the stream.
    #[must_use]
    pub fn metrics(&self) -> &ChannelMetrics {
        &self.metrics
    }
}

#[async_trait]
impl EventSink for ChannelEventSink {
    async fn emit(&self, event: PipelineEvent) {
        let event_type = event.event_type();
        if self.tx.send(ProgressFrame::Event(event)).await.is_ok() {
            self.metrics.events_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.metrics.events_dropped.fetch_add(1, Ordering::Relaxed);
            debug!(event_type, "Progress consumer gone, event dropped");
        }
    }

    fn keepalive(&self) {
        match self.tx.try_send(ProgressFrame::KeepAlive) {
            Ok(()) => {
                self.metrics.keepalives_sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.metrics.keepalives_skipped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// The consumer side of a progress channel.
///
/// Yields frames in emission order and ends once the run has finished and
/// the sink is dropped.
#[derive(Debug)]
pub struct ProgressStream {
    rx: mpsc::Receiver<ProgressFrame>,
    metrics: Arc<ChannelMetrics>,
}

impl ProgressStream {
    /// Receives the next frame.
    pub async fn recv(&mut self) -> Option<ProgressFrame> {
        self.rx.recv().await
    }

    /// Drains the stream, returning only pipeline events.
    pub async fn collect_events(mut self) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        while let Some(frame) = self.rx.recv().await {
            if let ProgressFrame::Event(event) = frame {
                events.push(event);
            }
        }
        events
    }

    /// Returns the delivery counters shared with the sink.
    #[must_use]
    pub fn metrics(&self) -> &ChannelMetrics {
        &self.metrics
    }
}

impl Stream for ProgressStream {
    type Item = ProgressFrame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
