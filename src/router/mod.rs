//! # Custom event router.
//!
//! Routes messages from the global [`MessageChannel`] to per-slot callbacks
//! registered through activation:
//!
//! - [`channel`]: the message channel itself;
//! - [`callbacks`]: `event id → slot id → callback` table;
//! - [`router`](mod@router): one listener per configured custom event.

mod callbacks;
mod channel;
#[allow(clippy::module_inception)]
mod router;

pub use callbacks::{EventCallback, EventHandlers};
pub use channel::MessageChannel;
pub(crate) use router::CustomEventRouter;
pub use router::resolve;
