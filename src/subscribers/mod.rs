//! # Event subscribers for the engine.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the built-in [`LogWriter`](crate::LogWriter) (feature `logging`).
//!
//! ## Architecture
//! ```text
//! Engine / InFlight batch / Router ── publish(Event) ──► Bus
//!                                                         │
//!                                             subscriber listener
//!                                                         │
//!                                                  SubscriberSet::emit
//!                                           ┌─────────────┼─────────────┐
//!                                           ▼             ▼             ▼
//!                                       LogWriter      Metrics        Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use bidvisor::{Subscribe, Event, EventKind};
//! use async_trait::async_trait;
//!
//! struct RefreshCounter;
//!
//! #[async_trait]
//! impl Subscribe for RefreshCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::RefreshIssued {
//!             // increment a counter
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "refresh-counter" }
//! }
//! ```

mod embedded;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
