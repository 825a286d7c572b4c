//! # Bridged enqueue.
//!
//! [`enqueue`] pushes an operation onto a [`CommandQueue`] and returns a
//! [`Settled`] future that completes once the queue has run it, whatever the
//! outcome. [`dispatch`] is the fire-and-forget variant.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::oneshot;

use crate::bridge::queue::CommandQueue;
use crate::error::{BridgeError, panic_message};

/// Receives every failure isolated at the bridge.
pub type ErrorHandler = Arc<dyn Fn(&BridgeError) + Send + Sync>;

/// Future returned by [`enqueue`]; resolves once the operation ran (or was dropped).
pub type Settled = BoxFuture<'static, ()>;

/// Pushes `operation` onto `queue` and returns a future that settles after it ran.
///
/// ### Outcomes
/// - `Ok(())` → the future resolves.
/// - `Err(e)` → `on_error(BridgeError::Failed)`, then the future resolves.
/// - panic → caught, `on_error(BridgeError::Panicked)`, then the future resolves.
/// - command dropped by the queue → `on_error(BridgeError::Dropped)` when the
///   future is polled to completion.
///
/// The push happens before this function returns, so dropping the future
/// does not cancel the operation.
pub fn enqueue<F>(queue: &dyn CommandQueue, operation: F, on_error: &ErrorHandler) -> Settled
where
    F: FnOnce() -> anyhow::Result<()> + Send + 'static,
{
    let name = queue.name();
    let (tx, rx) = oneshot::channel::<()>();
    let handler = Arc::clone(on_error);

    queue.push(Box::new(move || {
        match catch_unwind(AssertUnwindSafe(operation)) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => handler(&BridgeError::Failed {
                queue: name,
                error: format!("{err:#}"),
            }),
            Err(payload) => handler(&BridgeError::Panicked {
                queue: name,
                info: panic_message(&*payload),
            }),
        }
        let _ = tx.send(());
    }));

    let on_error = Arc::clone(on_error);
    async move {
        if rx.await.is_err() {
            on_error(&BridgeError::Dropped { queue: name });
        }
    }
    .boxed()
}

/// Pushes `operation` onto `queue` without waiting for it.
///
/// Failures still reach `on_error`; a dropped command goes unreported.
pub fn dispatch<F>(queue: &dyn CommandQueue, operation: F, on_error: &ErrorHandler)
where
    F: FnOnce() -> anyhow::Result<()> + Send + 'static,
{
    drop(enqueue(queue, operation, on_error));
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;

    use super::*;
    use crate::bridge::TaskQueue;
    use crate::testkit::ManualQueue;

    fn recording_handler() -> (ErrorHandler, Arc<Mutex<Vec<BridgeError>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: ErrorHandler = Arc::new(move |err: &BridgeError| sink.lock().unwrap().push(err.clone()));
        (handler, seen)
    }

    #[tokio::test]
    async fn settles_only_after_the_queue_runs_the_operation() {
        let queue = ManualQueue::new("manual");
        let (handler, errors) = recording_handler();
        let ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&ran);

        let mut settled = enqueue(
            &queue,
            move || {
                *flag.lock().unwrap() = true;
                Ok(())
            },
            &handler,
        );

        assert_eq!(queue.len(), 1);
        assert!((&mut settled).now_or_never().is_none());
        assert!(!*ran.lock().unwrap());

        queue.drain();
        settled.await;
        assert!(*ran.lock().unwrap());
        assert!(errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failures_are_reported_and_still_settle() {
        let queue = ManualQueue::new("orchestrator");
        let (handler, errors) = recording_handler();

        let failed = enqueue(&queue, || Err(anyhow!("no ad units")), &handler);
        let panicked = enqueue(&queue, || panic!("tag library exploded"), &handler);
        queue.drain();
        futures::join!(failed, panicked);

        assert_eq!(
            *errors.lock().unwrap(),
            vec![
                BridgeError::Failed {
                    queue: "orchestrator",
                    error: "no ad units".into()
                },
                BridgeError::Panicked {
                    queue: "orchestrator",
                    info: "tag library exploded".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn a_failing_sibling_does_not_block_the_join() {
        let left = ManualQueue::new("left");
        let right = ManualQueue::new("right");
        let (handler, errors) = recording_handler();

        let a = enqueue(&left, || Err(anyhow!("left broke")), &handler);
        let b = enqueue(&right, || Ok(()), &handler);
        right.drain();
        left.drain();
        futures::join!(a, b);

        assert_eq!(errors.lock().unwrap().len(), 1);
        assert_eq!(errors.lock().unwrap()[0].queue(), "left");
    }

    #[tokio::test]
    async fn dropped_commands_are_reported() {
        let queue = ManualQueue::new("lossy");
        let (handler, errors) = recording_handler();

        let settled = enqueue(&queue, || Ok(()), &handler);
        queue.discard();
        settled.await;

        assert_eq!(
            *errors.lock().unwrap(),
            vec![BridgeError::Dropped { queue: "lossy" }]
        );
    }

    #[tokio::test]
    async fn works_over_a_worker_drained_queue() {
        let queue = TaskQueue::spawn("worker");
        let (handler, errors) = recording_handler();

        enqueue(queue.as_ref(), || Ok(()), &handler).await;
        enqueue(queue.as_ref(), || Err(anyhow!("late failure")), &handler).await;

        assert_eq!(errors.lock().unwrap().len(), 1);
        assert_eq!(errors.lock().unwrap()[0].as_label(), "bridge_failed");
    }

    #[tokio::test]
    async fn dispatch_runs_without_being_awaited() {
        let queue = ManualQueue::new("fire-and-forget");
        let (handler, errors) = recording_handler();

        dispatch(&queue, || Err(anyhow!("nobody waits")), &handler);
        queue.drain();

        assert_eq!(errors.lock().unwrap().len(), 1);
    }
}
