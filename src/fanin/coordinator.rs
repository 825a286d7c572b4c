//! # Bid coordinator.
//!
//! Starts one `InFlight` batch per activation (or per drained activation
//! queue) and wires it to the bidding services and a failsafe timer.
//!
//! ```text
//! start(batch)
//!   ├─► spawn failsafe: sleep(timeout) ──────────────────────────► fire(Failsafe)
//!   ├─► exchange.fetch_bids(slots, done)
//!   │        done ─► [ad-server queue] set_display_bids ─► mark(Exchange) ─┐
//!   └─► [orchestrator queue] request_bids(codes, done)                     ├─► complete? ─► fire(FanIn)
//!            done ─► [ad-server queue] set_targeting ─► mark(Orchestrator) ┘
//!
//! fire(trigger): guard.try_fire() ─► [ad-server queue] refresh(batch handles)
//! ```
//!
//! ## Invariants
//! - The refresh of a batch is bridged at most once: the [`OnceGuard`](super::OnceGuard)
//!   decides between fan-in and failsafe.
//! - The failsafe always elapses eventually, so the refresh is bridged at least once.
//! - Batches never share state; their timers are independent and never cancelled.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::debug;

use super::state::{Batch, Bidder, FanInState, RefreshTrigger};
use crate::bridge::{ErrorHandler, dispatch};
use crate::collaborators::{BidsBack, Collaborators, SlotHandle};
use crate::config::Config;
use crate::error::BridgeError;
use crate::events::{Bus, Event, EventKind};
use crate::slots::{ExchangeSlot, exchange_slots};

pub(crate) struct BidCoordinator {
    collaborators: Collaborators,
    bus: Bus,
    on_error: ErrorHandler,
    runtime: Handle,
    next_batch: AtomicU64,
}

impl BidCoordinator {
    pub(crate) fn new(
        collaborators: Collaborators,
        bus: Bus,
        on_error: ErrorHandler,
        runtime: Handle,
    ) -> Self {
        Self {
            collaborators,
            bus,
            on_error,
            runtime,
            next_batch: AtomicU64::new(1),
        }
    }

    /// Requests bids for `slot_ids` and arms the failsafe. Returns the batch id.
    pub(crate) fn start(
        &self,
        config: &Config,
        slot_ids: Vec<String>,
        handles: Vec<SlotHandle>,
    ) -> u64 {
        let id = self.next_batch.fetch_add(1, Ordering::Relaxed);
        let exchange = exchange_slots(config, &slot_ids);
        let flight = Arc::new(InFlight {
            state: FanInState::new(!exchange.is_empty()),
            batch: Batch {
                id,
                slot_ids,
                handles,
            },
            collaborators: self.collaborators.clone(),
            bus: self.bus.clone(),
            on_error: Arc::clone(&self.on_error),
        });
        self.bus.publish(
            Event::now(EventKind::BatchStarted)
                .with_batch(id)
                .with_count(flight.batch.slot_ids.len()),
        );

        self.arm_failsafe(&flight, config.failsafe_timeout());
        if !exchange.is_empty() {
            self.request_exchange(&flight, exchange);
        }
        self.request_orchestrator(&flight);
        id
    }

    fn arm_failsafe(&self, flight: &Arc<InFlight>, timeout: Duration) {
        let flight = Arc::clone(flight);
        self.runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            flight.fire(RefreshTrigger::Failsafe);
        });
    }

    fn request_exchange(&self, flight: &Arc<InFlight>, slots: Vec<ExchangeSlot>) {
        let back = Arc::clone(flight);
        let done: BidsBack = Box::new(move || back.exchange_back());
        if let Err(err) = self.collaborators.exchange.fetch_bids(slots, done) {
            (self.on_error)(&BridgeError::Failed {
                queue: "exchange",
                error: format!("{err:#}"),
            });
        }
    }

    fn request_orchestrator(&self, flight: &Arc<InFlight>) {
        let back = Arc::clone(flight);
        let orchestrator = Arc::clone(&self.collaborators.orchestrator);
        let codes = flight.batch.codes();
        dispatch(
            self.collaborators.orchestrator_queue.as_ref(),
            move || {
                let done: BidsBack = Box::new(move || back.orchestrator_back());
                orchestrator.request_bids(codes, done)
            },
            &self.on_error,
        );
    }
}

/// One batch whose bids are outstanding.
///
/// Shared only by its own completion callbacks and its failsafe timer.
struct InFlight {
    batch: Batch,
    state: FanInState,
    collaborators: Collaborators,
    bus: Bus,
    on_error: ErrorHandler,
}

impl InFlight {
    fn exchange_back(self: Arc<Self>) {
        let exchange = Arc::clone(&self.collaborators.exchange);
        let queue = Arc::clone(&self.collaborators.ad_server_queue);
        let on_error = Arc::clone(&self.on_error);
        dispatch(
            queue.as_ref(),
            move || {
                let applied = exchange.set_display_bids();
                self.responded(Bidder::Exchange);
                applied
            },
            &on_error,
        );
    }

    fn orchestrator_back(self: Arc<Self>) {
        let orchestrator = Arc::clone(&self.collaborators.orchestrator);
        let queue = Arc::clone(&self.collaborators.ad_server_queue);
        let on_error = Arc::clone(&self.on_error);
        dispatch(
            queue.as_ref(),
            move || {
                let applied = orchestrator.set_targeting(&self.batch.codes());
                self.responded(Bidder::Orchestrator);
                applied
            },
            &on_error,
        );
    }

    fn responded(&self, bidder: Bidder) {
        self.bus.publish(
            Event::now(EventKind::BidderResponded)
                .with_batch(self.batch.id)
                .with_bidder(bidder),
        );
        if self.state.mark(bidder) {
            self.fire(RefreshTrigger::FanIn);
        }
    }

    fn fire(&self, trigger: RefreshTrigger) {
        let fired = self.state.guard().try_fire();
        if trigger == RefreshTrigger::Failsafe {
            let mut ev = Event::now(EventKind::FailsafeElapsed).with_batch(self.batch.id);
            if !fired {
                ev = ev.with_reason("noop");
            }
            self.bus.publish(ev);
        }
        if !fired {
            debug!(batch = self.batch.id, trigger = trigger.as_str(), "refresh already issued");
            return;
        }

        let handles = self.batch.refresh_handles();
        let count = handles.len();
        let ad_server = Arc::clone(&self.collaborators.ad_server);
        dispatch(
            self.collaborators.ad_server_queue.as_ref(),
            move || ad_server.refresh(Some(&handles)),
            &self.on_error,
        );
        self.bus.publish(
            Event::now(EventKind::RefreshIssued)
                .with_batch(self.batch.id)
                .with_trigger(trigger)
                .with_count(count),
        );
    }
}
