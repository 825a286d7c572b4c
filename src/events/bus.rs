//! # Event bus for broadcasting engine events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] so that the lifecycle controller,
//! in-flight bid batches (which publish from inside collaborator callbacks and
//! timer tasks) and the router can all report without blocking.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                    Receivers:
//!   Engine        ──┐
//!   InFlight batch──┼──────► Bus ──┬──► subscriber listener ──► SubscriberSet
//!   Router        ──┤              └──► Engine::subscribe_events() receivers
//!   Error handler ──┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks and never fails; with no receivers the event is dropped.
//! - One ring buffer of `capacity` events is shared by all receivers.
//! - Receivers that fall behind observe `RecvError::Lagged(n)` and skip `n` events.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for engine events.
///
/// Cheap to clone; every clone publishes into the same channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that observes events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
