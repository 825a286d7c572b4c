//! Engine events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the lifecycle controller, the bid
//! coordinator, the custom event router, the command bridge and subscriber
//! workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Engine` (setup/teardown/activation), `BidCoordinator`
//!   (batches, bidder responses, refresh, failsafe), `CustomEventRouter`,
//!   the bridge error handler, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the engine's subscriber listener (fans out to
//!   `SubscriberSet`) and any receiver obtained via `Engine::subscribe_events`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
