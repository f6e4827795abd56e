//! Progress channel for pipeline runs.
//!
//! The runner publishes typed [`PipelineEvent`](crate::core::PipelineEvent)s
//! to an [`EventSink`]. Transports (a channel feeding a stream, a log, a test
//! collector) implement the sink; [`with_keepalive`] keeps idle-sensitive
//! transports alive during long stage calls.

mod channel;
mod keepalive;
mod sink;

pub use channel::{progress_channel, ChannelEventSink, ChannelMetrics, ProgressStream};
pub use keepalive::with_keepalive;
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
