//! Keep-alive emission while a stage call is outstanding.

use super::EventSink;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Drives `future` to completion, signalling `sink.keepalive()` every
/// `interval` until it resolves.
///
/// The first keep-alive fires one full interval after the call starts, so
/// fast calls produce none. Keep-alives stop once the sink reports closed.
pub async fn with_keepalive<F>(sink: &dyn EventSink, interval: Duration, future: F) -> F::Output
where
    F: Future,
{
    tokio::pin!(future);

    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            output = &mut future => return output,
            _ = ticker.tick() => {
                if !sink.is_closed() {
                    sink.keepalive();
                }
            }
        }
    }
}
