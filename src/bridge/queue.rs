//! # Push-only command queues.
//!
//! [`CommandQueue`] is the contract of an external FIFO execution context: the
//! engine can only push; the owner decides when to run what was pushed.
//!
//! [`TaskQueue`] is a ready-made queue drained by a dedicated tokio worker,
//! for hosts that do not already own one.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use bidvisor::bridge::{self, ErrorHandler, TaskQueue};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let queue = TaskQueue::spawn("ad_server");
//! let on_error: ErrorHandler = Arc::new(|err| eprintln!("{err}"));
//!
//! bridge::enqueue(queue.as_ref(), || Ok(()), &on_error).await;
//! # }
//! ```

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::panic_message;

/// A unit of work pushed onto a [`CommandQueue`].
pub type Command = Box<dyn FnOnce() + Send + 'static>;

/// External, FIFO, push-only execution context.
///
/// ### Implementation requirements
/// - Run commands in push order.
/// - Never run a command twice. Dropping a command without running it is
///   allowed (the bridge reports it as [`BridgeError::Dropped`](crate::BridgeError::Dropped)).
pub trait CommandQueue: Send + Sync + 'static {
    /// Appends a command; must not run it re-entrantly from inside `push`
    /// unless the owner's semantics say so.
    fn push(&self, command: Command);

    /// Returns the queue name used in error reports.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A [`CommandQueue`] drained by a dedicated tokio worker task.
///
/// Commands run one at a time in push order; the worker yields between
/// commands. A command that panics is logged and skipped. Once the worker
/// is gone, pushed commands are dropped.
pub struct TaskQueue {
    name: &'static str,
    tx: mpsc::UnboundedSender<Command>,
    worker: JoinHandle<()>,
}

impl TaskQueue {
    /// Creates the queue and spawns its worker. Must be called inside a tokio runtime.
    pub fn spawn(name: &'static str) -> std::sync::Arc<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Command>();
        let worker = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                if let Err(payload) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(command)) {
                    warn!(queue = name, info = %panic_message(&*payload), "command panicked");
                }
                tokio::task::yield_now().await;
            }
        });
        std::sync::Arc::new(Self { name, tx, worker })
    }

    /// Stops the worker; commands still queued are dropped.
    pub fn close(&self) {
        self.worker.abort();
    }

    /// Returns `true` once the worker has stopped.
    pub fn is_closed(&self) -> bool {
        self.worker.is_finished() || self.tx.is_closed()
    }
}

impl CommandQueue for TaskQueue {
    fn push(&self, command: Command) {
        // A closed worker drops the command; the bridge reports it.
        let _ = self.tx.send(command);
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
