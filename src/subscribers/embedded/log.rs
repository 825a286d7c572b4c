//! # LogWriter: event renderer
//!
//! A minimal subscriber that renders incoming [`Event`]s with `tracing`
//! under the `bidvisor::events` target. Install a `tracing` subscriber in the
//! host application to see the output.
//!
//! ## Example output
//! ```text
//! INFO  bidvisor::events: [setup-completed] slots=Some(2)
//! DEBUG bidvisor::events: [activation-buffered] slot="top" queued=Some(1)
//! DEBUG bidvisor::events: [batch-started] batch=Some(0) slots=Some(2)
//! DEBUG bidvisor::events: [bidder-responded] batch=Some(0) bidder=orchestrator
//! INFO  bidvisor::events: [refresh] batch=Some(0) trigger=fan-in slots=Some(2)
//! WARN  bidvisor::events: [bridge-failed] queue="ad_server" err="..."
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "bidvisor::events";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn text(v: &Option<std::sync::Arc<str>>) -> &str {
    v.as_deref().unwrap_or("unknown")
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::SetupStarted => info!(target: TARGET, "[setup-started]"),
            EventKind::SetupCompleted => {
                info!(target: TARGET, "[setup-completed] slots={:?}", e.count)
            }
            EventKind::TeardownStarted => info!(target: TARGET, "[teardown-started]"),
            EventKind::TeardownCompleted => info!(target: TARGET, "[teardown-completed]"),
            EventKind::ActivationBuffered => debug!(
                target: TARGET,
                "[activation-buffered] slot={:?} queued={:?}",
                text(&e.slot),
                e.count
            ),
            EventKind::ActivationDropped => debug!(
                target: TARGET,
                "[activation-dropped] slot={:?} unknown",
                text(&e.slot)
            ),
            EventKind::BatchStarted => debug!(
                target: TARGET,
                "[batch-started] batch={:?} slots={:?}",
                e.batch,
                e.count
            ),
            EventKind::BidderResponded => debug!(
                target: TARGET,
                "[bidder-responded] batch={:?} bidder={}",
                e.batch,
                e.bidder.map(|b| b.as_str()).unwrap_or("unknown")
            ),
            EventKind::RefreshIssued => info!(
                target: TARGET,
                "[refresh] batch={:?} trigger={} slots={:?}",
                e.batch,
                e.trigger.map(|t| t.as_str()).unwrap_or("unknown"),
                e.count
            ),
            EventKind::FailsafeElapsed => debug!(
                target: TARGET,
                "[failsafe] batch={:?} {}",
                e.batch,
                e.reason.as_deref().unwrap_or("refreshing")
            ),
            EventKind::BridgeFailed => warn!(
                target: TARGET,
                "[bridge-failed] queue={:?} err={:?}",
                text(&e.source),
                text(&e.reason)
            ),
            EventKind::CustomEventDispatched => debug!(
                target: TARGET,
                "[custom-event] event={:?} slot={:?}",
                text(&e.source),
                text(&e.slot)
            ),
            EventKind::SubscriberOverflow => warn!(
                target: TARGET,
                "[subscriber-overflow] subscriber={:?} reason={:?}",
                text(&e.source),
                text(&e.reason)
            ),
            EventKind::SubscriberPanicked => warn!(
                target: TARGET,
                "[subscriber-panicked] subscriber={} info={}",
                text(&e.source),
                text(&e.reason)
            ),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fanin::RefreshTrigger;

    #[tokio::test]
    async fn renders_every_kind_without_a_global_subscriber() {
        let writer = LogWriter::new();
        for ev in [
            Event::now(EventKind::SetupCompleted).with_count(2),
            Event::now(EventKind::RefreshIssued).with_trigger(RefreshTrigger::FanIn),
            Event::now(EventKind::BridgeFailed).with_source("ad_server"),
            Event::subscriber_panicked("x", "boom".into()),
        ] {
            writer.on_event(&ev).await;
        }
        assert_eq!(writer.name(), "LogWriter");
    }
}
