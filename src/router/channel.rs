//! Global message channel consumed by the custom event router.

use std::sync::Arc;

use tokio::sync::broadcast;

/// Broadcast channel of string messages (e.g. cross-frame `postMessage` payloads).
///
/// Cheap to clone; every clone delivers into the same channel. Listeners only
/// see messages delivered after they subscribed.
#[derive(Clone, Debug)]
pub struct MessageChannel {
    tx: broadcast::Sender<Arc<str>>,
}

impl MessageChannel {
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Creates a channel buffering up to `capacity` messages per listener (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Delivers a message to every listener and returns how many there were.
    pub fn deliver(&self, message: impl Into<Arc<str>>) -> usize {
        self.tx.send(message.into()).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<str>> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for MessageChannel {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
