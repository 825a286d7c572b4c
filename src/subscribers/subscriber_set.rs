//! # Non-blocking event fan-out to multiple subscribers.
//!
//! [`SubscriberSet`] hands every engine event to each subscriber's bounded
//! queue; one worker task per subscriber drains it.
//!
//! ```text
//! emit(event)
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - `emit()` uses `try_send` and returns immediately.
//! - A full or closed queue drops the event for that subscriber only and
//!   publishes `SubscriberOverflow` (never for an overflow event itself).
//! - Panics inside `on_event` are caught (`AssertUnwindSafe`) and published as
//!   `SubscriberPanicked`; the worker keeps going.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::panic_message;
use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for event subscribers.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker per subscriber.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            workers.push(tokio::spawn(Self::worker(sub, rx, bus.clone())));
            channels.push(SubscriberChannel { name, sender: tx });
        }
        Self {
            channels,
            workers,
            bus,
        }
    }

    async fn worker(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
        while let Some(ev) = rx.recv().await {
            let fut = sub.on_event(ev.as_ref());
            if let Err(payload) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                bus.publish(Event::subscriber_panicked(sub.name(), panic_message(&*payload)));
            }
        }
    }

    /// Number of subscribers in the set.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns `true` when no subscribers are registered.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Emits an event to all subscribers (clones it once into an `Arc`).
    pub fn emit(&self, event: &Event) {
        if self.channels.is_empty() {
            return;
        }
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Emits a shared event to all subscribers without cloning it.
    pub fn emit_arc(&self, event: Arc<Event>) {
        let is_overflow_evt = event.is_subscriber_overflow();

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !is_overflow_evt {
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Closes all queues and waits for the workers to drain them.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }
}
