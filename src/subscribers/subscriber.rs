//! # Event subscriber trait.
//!
//! Provides [`Subscribe`], the extension point for observing engine events
//! (logging, metrics, auditing of refresh calls).
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are reported as `EventKind::SubscriberPanicked`)
//!
//! ## Rules
//! - A slow subscriber only affects its own queue.
//! - Queue overflow drops the event **for this subscriber only** and publishes
//!   `EventKind::SubscriberOverflow`.
//! - Events are processed sequentially (FIFO) per subscriber.
//! - Subscribers never block the engine or collaborator callbacks.

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for engine observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, never from inside a command queue.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in overflow/panic events.
    ///
    /// The default uses `type_name::<Self>()`; override it with something short.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber (clamped to 1).
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
