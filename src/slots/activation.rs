//! # Activation queue.
//!
//! Buffers activation requests submitted while the slot registry is empty.
//!
//! ## Invariants
//! - Requests are replayed strictly in submission order.
//! - Each request is consumed exactly once: [`ActivationQueue::drain`] empties the queue.
//! - Duplicate slot ids are kept; deduplication is not the queue's business.

use std::collections::VecDeque;

use crate::router::EventHandlers;

/// One buffered `activate(slot_id, handlers)` call.
#[derive(Clone)]
pub struct ActivationRequest {
    pub slot_id: String,
    pub handlers: EventHandlers,
}

impl std::fmt::Debug for ActivationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut events: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        events.sort_unstable();
        f.debug_struct("ActivationRequest")
            .field("slot_id", &self.slot_id)
            .field("events", &events)
            .finish()
    }
}

/// FIFO buffer of early activations.
#[derive(Debug, Default)]
pub struct ActivationQueue {
    pending: VecDeque<ActivationRequest>,
}

impl ActivationQueue {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a request and returns the new queue length.
    pub fn push(&mut self, request: ActivationRequest) -> usize {
        self.pending.push_back(request);
        self.pending.len()
    }

    /// Takes every buffered request, oldest first.
    pub fn drain(&mut self) -> Vec<ActivationRequest> {
        self.pending.drain(..).collect()
    }

    /// Buffered slot ids, oldest first.
    pub fn slot_ids(&self) -> Vec<String> {
        self.pending.iter().map(|r| r.slot_id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
