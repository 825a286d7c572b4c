//! # Events emitted by the engine.
//!
//! The [`EventKind`] enum classifies events across four categories:
//! - **Lifecycle events**: setup/teardown progress
//! - **Activation events**: buffered or dropped activation requests
//! - **Bidding events**: batch start, bidder responses, refresh, failsafe
//! - **Diagnostics**: bridge failures, custom event dispatch, subscriber health
//!
//! The [`Event`] struct carries the optional metadata (slot, batch id, bidder,
//! refresh trigger, counts, reasons).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically; use it to restore order across receivers.
//!
//! ## Example
//! ```rust
//! use bidvisor::{Event, EventKind, RefreshTrigger};
//!
//! let ev = Event::now(EventKind::RefreshIssued)
//!     .with_batch(7)
//!     .with_trigger(RefreshTrigger::Failsafe)
//!     .with_count(2);
//!
//! assert_eq!(ev.kind, EventKind::RefreshIssued);
//! assert_eq!(ev.batch, Some(7));
//! assert_eq!(ev.trigger, Some(RefreshTrigger::Failsafe));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::fanin::{Bidder, RefreshTrigger};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of engine events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Lifecycle ===
    /// `setup()` started.
    SetupStarted,

    /// `setup()` finished both bridged initializations.
    ///
    /// Sets:
    /// - `count`: number of slots in the registry
    SetupCompleted,

    /// `teardown()` started.
    TeardownStarted,

    /// `teardown()` finished; registry, caches and queue are empty.
    TeardownCompleted,

    // === Activation ===
    /// Activation arrived before the registry was populated and was buffered.
    ///
    /// Sets:
    /// - `slot`: slot id
    /// - `count`: queue length after buffering
    ActivationBuffered,

    /// Activation for a slot id that is not registered; dropped silently.
    ///
    /// Sets:
    /// - `slot`: slot id
    ActivationDropped,

    // === Bidding ===
    /// A bid batch was created and bids were requested.
    ///
    /// Sets:
    /// - `batch`: batch id
    /// - `count`: number of slots in the batch
    BatchStarted,

    /// A bidding service reported back for a batch.
    ///
    /// Sets:
    /// - `batch`: batch id
    /// - `bidder`: which service
    BidderResponded,

    /// The single-fire guard fired and the restricted refresh was bridged.
    ///
    /// Sets:
    /// - `batch`: batch id
    /// - `trigger`: fan-in or failsafe
    /// - `count`: number of slot handles refreshed
    RefreshIssued,

    /// The failsafe timer of a batch elapsed.
    ///
    /// Sets:
    /// - `batch`: batch id
    /// - `reason`: `"noop"` when the refresh had already been issued
    FailsafeElapsed,

    // === Diagnostics ===
    /// A collaborator operation failed at the bridge.
    ///
    /// Sets:
    /// - `source`: queue/collaborator name
    /// - `reason`: rendered [`BridgeError`](crate::BridgeError)
    BridgeFailed,

    /// A custom event message invoked a slot callback.
    ///
    /// Sets:
    /// - `source`: event id
    /// - `slot`: slot id
    CustomEventDispatched,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: `"full"` or `"closed"`
    SubscriberOverflow,

    /// Subscriber panicked while processing an event.
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: panic message
    SubscriberPanicked,
}

/// Engine event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Slot id, if applicable.
    pub slot: Option<Arc<str>>,
    /// Bid batch id, if applicable.
    pub batch: Option<u64>,
    /// Bidding service, if applicable.
    pub bidder: Option<Bidder>,
    /// What fired the refresh.
    pub trigger: Option<RefreshTrigger>,
    /// A count whose meaning depends on the kind.
    pub count: Option<u32>,
    /// Emitting component (queue, subscriber, event id).
    pub source: Option<Arc<str>>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            slot: None,
            batch: None,
            bidder: None,
            trigger: None,
            count: None,
            source: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_slot(mut self, slot: impl Into<Arc<str>>) -> Self {
        self.slot = Some(slot.into());
        self
    }

    #[inline]
    pub fn with_batch(mut self, batch: u64) -> Self {
        self.batch = Some(batch);
        self
    }

    #[inline]
    pub fn with_bidder(mut self, bidder: Bidder) -> Self {
        self.bidder = Some(bidder);
        self
    }

    #[inline]
    pub fn with_trigger(mut self, trigger: RefreshTrigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Attaches a count (saturates at `u32::MAX`).
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_source(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_source(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}
