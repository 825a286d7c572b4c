//! # Custom event router.
//!
//! One listener task per subscribed event id. Each listener reads the
//! [`MessageChannel`], keeps messages starting with the event's prefix, maps
//! the remainder to a slot id and invokes the callback registered for
//! `(event id, slot id)`.
//!
//! ```text
//! deliver("expand:top") ──► listener["expand"] ── prefix "expand:" ──► slot "ad-top"
//!                                                                        │
//!                                               CallbackTable["expand"]["ad-top"]()
//! ```
//!
//! ## Rules
//! - At most one listener per event id; subscribing again replaces the old one.
//! - The receiver is created before `subscribe` returns, so no message
//!   delivered afterwards is missed.
//! - A lagging listener skips the lost messages and keeps going.
//! - A panicking callback is logged and does not stop the listener.

use std::collections::{BTreeMap, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::callbacks::{CallbackTable, EventHandlers};
use super::channel::MessageChannel;
use crate::config::CustomEventConfig;
use crate::error::panic_message;
use crate::events::{Bus, Event, EventKind};

/// Maps a message to the slot it targets, if it carries the event's prefix.
pub fn resolve(message: &str, config: &CustomEventConfig) -> Option<String> {
    let suffix = message.strip_prefix(config.message_prefix.as_str())?;
    Some(format!("{}{}", config.slot_id_prefix, suffix))
}

pub(crate) struct CustomEventRouter {
    channel: MessageChannel,
    callbacks: Arc<RwLock<CallbackTable>>,
    listeners: Mutex<HashMap<String, CancellationToken>>,
    bus: Bus,
    runtime: Handle,
}

impl CustomEventRouter {
    pub(crate) fn new(channel: MessageChannel, bus: Bus, runtime: Handle) -> Self {
        Self {
            channel,
            callbacks: Arc::new(RwLock::new(CallbackTable::new())),
            listeners: Mutex::new(HashMap::new()),
            bus,
            runtime,
        }
    }

    /// Starts listening for `event_id`, replacing any existing listener for it.
    pub(crate) fn subscribe(&self, event_id: &str, config: &CustomEventConfig) {
        let token = CancellationToken::new();
        let rx = self.channel.subscribe();

        let previous = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(event_id.to_string(), token.clone());
        if let Some(old) = previous {
            debug!(event_id, "replacing custom event listener");
            old.cancel();
        }

        self.runtime.spawn(listen(
            Arc::from(event_id),
            config.clone(),
            rx,
            Arc::clone(&self.callbacks),
            self.bus.clone(),
            token,
        ));
    }

    /// Installs one listener per configured custom event.
    pub(crate) fn install(&self, events: &BTreeMap<String, CustomEventConfig>) {
        for (event_id, config) in events {
            self.subscribe(event_id, config);
        }
    }

    /// Stops the listener for `event_id`; returns `false` if there was none.
    #[cfg(test)]
    pub(crate) fn unsubscribe(&self, event_id: &str) -> bool {
        let removed = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(event_id);
        removed.map(|token| token.cancel()).is_some()
    }

    pub(crate) fn unsubscribe_all(&self) {
        let drained: Vec<CancellationToken> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, token)| token)
            .collect();
        for token in drained {
            token.cancel();
        }
    }

    #[cfg(test)]
    pub(crate) fn is_subscribed(&self, event_id: &str) -> bool {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(event_id)
    }

    /// Registers the handlers of one activation for `slot_id`.
    pub(crate) fn register(&self, slot_id: &str, handlers: &EventHandlers) {
        if handlers.is_empty() {
            return;
        }
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .merge(slot_id, handlers);
    }

    #[cfg(test)]
    pub(crate) fn callback_count(&self) -> usize {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub(crate) fn clear_callbacks(&self) {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Drop for CustomEventRouter {
    fn drop(&mut self) {
        self.unsubscribe_all();
    }
}

async fn listen(
    event_id: Arc<str>,
    config: CustomEventConfig,
    mut rx: broadcast::Receiver<Arc<str>>,
    callbacks: Arc<RwLock<CallbackTable>>,
    bus: Bus,
    token: CancellationToken,
) {
    loop {
        let message = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            msg = rx.recv() => msg,
        };
        match message {
            Ok(message) => dispatch(&event_id, &config, &message, &callbacks, &bus),
            Err(RecvError::Lagged(skipped)) => {
                warn!(event_id = &*event_id, skipped, "custom event listener lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn dispatch(
    event_id: &Arc<str>,
    config: &CustomEventConfig,
    message: &str,
    callbacks: &RwLock<CallbackTable>,
    bus: &Bus,
) {
    let Some(slot_id) = resolve(message, config) else {
        return;
    };
    let callback = callbacks
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(event_id, &slot_id);
    let Some(callback) = callback else {
        return;
    };

    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback())) {
        warn!(
            event_id = &**event_id,
            slot_id = %slot_id,
            panic = %panic_message(&*payload),
            "custom event callback panicked"
        );
    }
    bus.publish(
        Event::now(EventKind::CustomEventDispatched)
            .with_source(Arc::clone(event_id))
            .with_slot(slot_id),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    fn expand() -> CustomEventConfig {
        CustomEventConfig {
            message_prefix: "expand:".into(),
            slot_id_prefix: "ad-".into(),
        }
    }

    fn counter_handlers(event_id: &str, hits: &Arc<AtomicUsize>) -> EventHandlers {
        let hits = Arc::clone(hits);
        EventHandlers::from([(
            event_id.to_string(),
            Arc::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }) as _,
        )])
    }

    async fn next_dispatch(rx: &mut broadcast::Receiver<Event>) -> Event {
        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                let ev = rx.recv().await.unwrap();
                if ev.kind == EventKind::CustomEventDispatched {
                    return ev;
                }
            }
        })
        .await
        .unwrap()
    }

    #[test]
    fn resolve_strips_prefix_and_applies_slot_prefix() {
        assert_eq!(resolve("expand:top", &expand()).as_deref(), Some("ad-top"));
        assert_eq!(resolve("expand:", &expand()).as_deref(), Some("ad-"));
        assert_eq!(resolve("collapse:top", &expand()), None);
        assert_eq!(resolve("xexpand:top", &expand()), None);
    }

    #[tokio::test]
    async fn dispatches_only_matching_registered_pairs() {
        let bus = Bus::new(64);
        let mut events = bus.subscribe();
        let channel = MessageChannel::default();
        let router = CustomEventRouter::new(channel.clone(), bus, Handle::current());

        let top = Arc::new(AtomicUsize::new(0));
        let side = Arc::new(AtomicUsize::new(0));
        router.register("ad-top", &counter_handlers("expand", &top));
        router.register("ad-side", &counter_handlers("collapse", &side));
        router.subscribe("expand", &expand());

        channel.deliver("unrelated message");
        channel.deliver("expand:bottom");
        channel.deliver("expand:side");
        channel.deliver("expand:top");

        let ev = next_dispatch(&mut events).await;
        assert_eq!(ev.slot.as_deref(), Some("ad-top"));
        assert_eq!(ev.source.as_deref(), Some("expand"));
        assert_eq!(top.load(Ordering::SeqCst), 1);
        assert_eq!(side.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resubscribing_keeps_a_single_listener() {
        let bus = Bus::new(64);
        let mut events = bus.subscribe();
        let channel = MessageChannel::default();
        let router = CustomEventRouter::new(channel.clone(), bus, Handle::current());

        let hits = Arc::new(AtomicUsize::new(0));
        router.register("ad-top", &counter_handlers("expand", &hits));
        router.subscribe("expand", &expand());
        router.subscribe("expand", &expand());
        assert!(router.is_subscribed("expand"));

        channel.deliver("expand:top");
        next_dispatch(&mut events).await;
        channel.deliver("expand:top");
        next_dispatch(&mut events).await;

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsubscribed_events_are_ignored() {
        let bus = Bus::new(64);
        let mut events = bus.subscribe();
        let channel = MessageChannel::default();
        let router = CustomEventRouter::new(channel.clone(), bus, Handle::current());

        let expanded = Arc::new(AtomicUsize::new(0));
        let collapsed = Arc::new(AtomicUsize::new(0));
        router.register("ad-top", &counter_handlers("expand", &expanded));
        router.register("ad-top", &counter_handlers("collapse", &collapsed));
        router.install(&BTreeMap::from([
            ("expand".to_string(), expand()),
            (
                "collapse".to_string(),
                CustomEventConfig {
                    message_prefix: "collapse:".into(),
                    slot_id_prefix: "ad-".into(),
                },
            ),
        ]));

        assert!(router.unsubscribe("expand"));
        assert!(!router.unsubscribe("expand"));

        channel.deliver("expand:top");
        channel.deliver("collapse:top");
        let ev = next_dispatch(&mut events).await;

        assert_eq!(ev.source.as_deref(), Some("collapse"));
        assert_eq!(collapsed.load(Ordering::SeqCst), 1);
        assert_eq!(expanded.load(Ordering::SeqCst), 0);
        assert_eq!(router.callback_count(), 2);

        router.unsubscribe_all();
        assert!(!router.is_subscribed("collapse"));
    }
}
