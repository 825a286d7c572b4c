use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;
use tracing::warn;

use super::engine::{Engine, Inner};
use super::state::EngineState;
use crate::bridge::ErrorHandler;
use crate::collaborators::{Collaborators, ExchangeLoader, Plugin};
use crate::config::{Config, DEFAULT_BUS_CAPACITY};
use crate::error::BridgeError;
use crate::events::{Bus, Event, EventKind};
use crate::fanin::BidCoordinator;
use crate::router::CustomEventRouter;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for an [`Engine`].
pub struct EngineBuilder {
    collaborators: Collaborators,
    config: Option<Config>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    plugins: Vec<Arc<dyn Plugin>>,
    on_error: Option<ErrorHandler>,
}

impl EngineBuilder {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            config: None,
            subscribers: Vec::new(),
            plugins: Vec::new(),
            on_error: None,
        }
    }

    /// Sets the initial configuration; it also sizes the event bus.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive engine events through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets lifecycle plugins, invoked in order.
    pub fn with_plugins(mut self, plugins: Vec<Arc<dyn Plugin>>) -> Self {
        self.plugins = plugins;
        self
    }

    /// Sets the handler receiving collaborator failures.
    ///
    /// Without one, failures are logged with `tracing::warn!`. Either way they
    /// are also published as [`EventKind::BridgeFailed`].
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&BridgeError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Builds the engine.
    ///
    /// Must be called inside a tokio runtime: subscriber workers, router
    /// listeners and failsafe timers are spawned onto it.
    pub fn build(self) -> Engine {
        let runtime = Handle::current();
        let bus_capacity = self
            .config
            .as_ref()
            .map_or(DEFAULT_BUS_CAPACITY, Config::bus_capacity_clamped);
        let bus = Bus::new(bus_capacity);
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        subscriber_listener(&bus, &subs);

        let on_error = publishing_handler(self.on_error, bus.clone());
        let router = CustomEventRouter::new(
            self.collaborators.messages.clone(),
            bus.clone(),
            runtime.clone(),
        );
        let coordinator = BidCoordinator::new(
            self.collaborators.clone(),
            bus.clone(),
            Arc::clone(&on_error),
            runtime,
        );

        Engine::from_inner(Inner {
            collaborators: self.collaborators,
            state: Arc::new(Mutex::new(EngineState {
                config: self.config.map(Arc::new),
                ..EngineState::default()
            })),
            router,
            coordinator,
            loader: ExchangeLoader::new(),
            plugins: Arc::from(self.plugins),
            on_error,
            bus,
            subs,
        })
    }
}

/// Forwards bus events to the subscriber set (fire-and-forget).
fn subscriber_listener(bus: &Bus, subs: &Arc<SubscriberSet>) {
    if subs.is_empty() {
        return;
    }
    let mut rx = bus.subscribe();
    let set = Arc::clone(subs);
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(&ev),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber listener lagged behind the event bus");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn publishing_handler(user: Option<ErrorHandler>, bus: Bus) -> ErrorHandler {
    Arc::new(move |err: &BridgeError| {
        match &user {
            Some(handler) => handler(err),
            None => warn!(
                label = err.as_label(),
                queue = err.queue(),
                error = %err,
                "collaborator operation failed"
            ),
        }
        bus.publish(
            Event::now(EventKind::BridgeFailed)
                .with_source(err.queue())
                .with_reason(err.as_message()),
        );
    })
}
