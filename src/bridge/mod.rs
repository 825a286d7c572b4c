//! # Command queue bridge.
//!
//! Every interaction with the ad-server tag library and the orchestrator goes
//! through a push-only [`CommandQueue`] that the collaborator drains on its
//! own schedule. The bridge turns "push a closure" into "await completion":
//!
//! ```text
//! enqueue(queue, op, on_error) ──push──► [ queue ] ── drained later ──► op()
//!        │                                                              │
//!        ▼                                                   Ok  ──► settle
//!    Settled future  ◄───────────── oneshot ─────────────── Err ──► on_error, settle
//!                                                          panic ──► on_error, settle
//! ```
//!
//! ## Rules
//! - The command is pushed synchronously, when `enqueue` is called.
//! - The returned future never fails: `join!` over several bridged calls
//!   always completes even if one side errored.
//! - Errors and panics are delivered to the [`ErrorHandler`] only.
//!
//! - [`queue`]: the [`CommandQueue`] trait and the tokio-backed [`TaskQueue`];
//! - [`enqueue`](mod@enqueue): the bridge itself.

mod enqueue;
mod queue;

pub use enqueue::{ErrorHandler, Settled, dispatch, enqueue};
pub use queue::{Command, CommandQueue, TaskQueue};
