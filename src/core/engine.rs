//! # Engine: lifecycle controller and activation entry point.
//!
//! [`Engine`] sequences setup and teardown of the collaborators through the
//! command bridge, buffers activations until the slot registry is populated,
//! and hands every activation batch to the bid coordinator.
//!
//! ## Setup
//! ```text
//! setup()
//!   ├─► exchange: ensure_loaded(), init(pub_id, ad_server)
//!   ├─► plugins.setup()
//!   ├─► router.install(custom events)
//!   ├─► join!( enqueue(orchestrator queue, setup_orchestrator),
//!   │          enqueue(ad-server queue,    setup_ad_server → registry swap) )
//!   ├─► state = Ready
//!   └─► drain activation queue ─► ONE batch ─► coordinator.start()
//! ```
//!
//! ## Activation
//! ```text
//! activate(slot, handlers)
//!   ├─ registry empty or setting up ─► buffer (ActivationBuffered)
//!   ├─ unknown slot                 ─► drop   (ActivationDropped)
//!   └─ known slot                   ─► register handlers ─► coordinator.start([slot])
//! ```
//!
//! ## Rules
//! - `setup()` and `teardown()` resolve even when a collaborator failed; the
//!   error handler is the only channel for those failures.
//! - Calling `setup()` while a setup is in progress is a caller error and is
//!   not guarded.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::debug;

use super::lifecycle::LifecycleState;
use super::setup::{self, Plugins};
use super::state::EngineState;
use crate::bridge::{ErrorHandler, enqueue};
use crate::collaborators::{Collaborators, ExchangeLoader, SlotHandle};
use crate::config::Config;
use crate::core::EngineBuilder;
use crate::error::{BridgeError, EngineError};
use crate::events::{Bus, Event, EventKind};
use crate::fanin::BidCoordinator;
use crate::router::{CustomEventRouter, EventHandlers};
use crate::slots::ActivationRequest;
use crate::subscribers::SubscriberSet;

/// Header-bidding coordination engine.
///
/// Cheap to clone; clones drive the same engine.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    pub(crate) collaborators: Collaborators,
    pub(crate) state: Arc<Mutex<EngineState>>,
    pub(crate) router: CustomEventRouter,
    pub(crate) coordinator: BidCoordinator,
    pub(crate) loader: ExchangeLoader,
    pub(crate) plugins: Plugins,
    pub(crate) on_error: ErrorHandler,
    pub(crate) bus: Bus,
    pub(crate) subs: Arc<SubscriberSet>,
}

impl Engine {
    /// Starts building an engine around `collaborators`.
    pub fn builder(collaborators: Collaborators) -> EngineBuilder {
        EngineBuilder::new(collaborators)
    }

    pub(crate) fn from_inner(inner: Inner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn config(&self) -> Result<Arc<Config>, EngineError> {
        self.lock()
            .config
            .clone()
            .ok_or(EngineError::ConfigurationMissing)
    }

    /// Replaces the configuration used by the next `setup`/`teardown` and by bidding.
    pub fn set_configuration(&self, config: Config) {
        self.lock().config = Some(Arc::new(config));
    }

    /// Returns `true` once a configuration is set.
    pub fn is_ready(&self) -> bool {
        self.lock().config.is_some()
    }

    pub fn state(&self) -> LifecycleState {
        self.lock().lifecycle
    }

    /// Registered slot ids (standard, then out-of-page), in definition order.
    pub fn registered_slots(&self) -> Vec<String> {
        self.lock().registry.ids()
    }

    /// Slot ids of buffered activations, oldest first.
    pub fn pending_activations(&self) -> Vec<String> {
        self.lock().queue.slot_ids()
    }

    /// Receiver of every engine event published from now on.
    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    /// Number of subscribers receiving events through the fan-out.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subs.len()
    }

    /// Sets up every collaborator, then replays buffered activations as one batch.
    ///
    /// # Errors
    /// [`EngineError::ConfigurationMissing`] if no configuration is set.
    /// Collaborator failures are not errors here; they go to the error handler.
    pub async fn setup(&self) -> Result<(), EngineError> {
        let config = self.config()?;
        let inner = &self.inner;
        self.lock().lifecycle = LifecycleState::SettingUp;
        inner.bus.publish(Event::now(EventKind::SetupStarted));

        self.setup_exchange(&config);
        for plugin in inner.plugins.iter() {
            plugin.setup(&config);
        }
        inner.router.install(&config.custom_events);

        let orchestrator = {
            let orchestrator = Arc::clone(&inner.collaborators.orchestrator);
            let config = Arc::clone(&config);
            let plugins = Arc::clone(&inner.plugins);
            enqueue(
                inner.collaborators.orchestrator_queue.as_ref(),
                move || setup::setup_orchestrator(orchestrator.as_ref(), &config, &plugins),
                &inner.on_error,
            )
        };
        let ad_server = {
            let ad_server = Arc::clone(&inner.collaborators.ad_server);
            let config = Arc::clone(&config);
            let plugins = Arc::clone(&inner.plugins);
            let state = Arc::clone(&inner.state);
            enqueue(
                inner.collaborators.ad_server_queue.as_ref(),
                move || setup::setup_ad_server(ad_server.as_ref(), &config, &plugins, &state),
                &inner.on_error,
            )
        };
        futures::join!(orchestrator, ad_server);

        let (drained, registered) = {
            let mut st = self.lock();
            st.lifecycle = LifecycleState::Ready;
            (st.queue.drain(), st.registry.len())
        };
        self.replay(&config, drained);

        inner
            .bus
            .publish(Event::now(EventKind::SetupCompleted).with_count(registered));
        Ok(())
    }

    fn setup_exchange(&self, config: &Config) {
        let inner = &self.inner;
        let client = inner.collaborators.exchange.as_ref();
        let initialized = inner.loader.ensure_loaded(client).and_then(|_| match &config.exchange {
            Some(exchange) => client.init(&exchange.pub_id, &exchange.ad_server),
            None => Ok(()),
        });
        if let Err(err) = initialized {
            (inner.on_error)(&BridgeError::Failed {
                queue: "exchange",
                error: format!("{err:#}"),
            });
        }
    }

    /// Replays drained activations as one batch, in insertion order.
    fn replay(&self, config: &Config, drained: Vec<ActivationRequest>) {
        if drained.is_empty() {
            return;
        }

        let mut slot_ids = Vec::with_capacity(drained.len());
        let mut handles = Vec::with_capacity(drained.len());
        let mut dropped = Vec::new();
        {
            let st = self.lock();
            for request in &drained {
                match st.registry.get(&request.slot_id) {
                    Some(handle) => {
                        slot_ids.push(request.slot_id.clone());
                        handles.push(handle);
                    }
                    None => dropped.push(request.slot_id.clone()),
                }
            }
        }

        for request in &drained {
            self.inner.router.register(&request.slot_id, &request.handlers);
        }
        for slot in dropped {
            debug!(slot = %slot, "buffered activation for unknown slot dropped");
            self.inner
                .bus
                .publish(Event::now(EventKind::ActivationDropped).with_slot(slot));
        }
        if !slot_ids.is_empty() {
            self.inner.coordinator.start(config, slot_ids, handles);
        }
    }

    /// Tears every collaborator down and resets the engine to its initial shape.
    ///
    /// # Errors
    /// [`EngineError::ConfigurationMissing`] if no configuration is set.
    pub async fn teardown(&self) -> Result<(), EngineError> {
        let config = self.config()?;
        let inner = &self.inner;
        self.lock().lifecycle = LifecycleState::TearingDown;
        inner.bus.publish(Event::now(EventKind::TeardownStarted));

        inner.router.unsubscribe_all();

        let orchestrator = {
            let orchestrator = Arc::clone(&inner.collaborators.orchestrator);
            let config = Arc::clone(&config);
            let plugins = Arc::clone(&inner.plugins);
            enqueue(
                inner.collaborators.orchestrator_queue.as_ref(),
                move || setup::teardown_orchestrator(orchestrator.as_ref(), &config, &plugins),
                &inner.on_error,
            )
        };
        let ad_server = {
            let ad_server = Arc::clone(&inner.collaborators.ad_server);
            let config = Arc::clone(&config);
            let plugins = Arc::clone(&inner.plugins);
            enqueue(
                inner.collaborators.ad_server_queue.as_ref(),
                move || setup::teardown_ad_server(ad_server.as_ref(), &config, &plugins),
                &inner.on_error,
            )
        };
        futures::join!(orchestrator, ad_server);

        self.lock().reset();
        inner.router.clear_callbacks();
        inner.bus.publish(Event::now(EventKind::TeardownCompleted));
        Ok(())
    }

    /// Activates `slot_id`, registering its custom event `handlers`.
    ///
    /// - While the registry is empty or a setup is still in progress the
    ///   request is buffered and replayed when setup completes.
    /// - A slot that is not registered is ignored.
    /// - Otherwise bids are requested for this slot alone and the slot is
    ///   refreshed once, by fan-in or by the failsafe.
    pub fn activate(&self, slot_id: impl Into<String>, handlers: EventHandlers) {
        let slot_id = slot_id.into();
        let (handle, config): (SlotHandle, Arc<Config>) = {
            let mut st = self.lock();
            if st.registry.is_empty() || st.lifecycle == LifecycleState::SettingUp {
                let pending = st.queue.push(ActivationRequest {
                    slot_id: slot_id.clone(),
                    handlers,
                });
                drop(st);
                self.inner.bus.publish(
                    Event::now(EventKind::ActivationBuffered)
                        .with_slot(slot_id)
                        .with_count(pending),
                );
                return;
            }
            match (st.registry.get(&slot_id), st.config.clone()) {
                (Some(handle), Some(config)) => (handle, config),
                _ => {
                    drop(st);
                    self.inner
                        .bus
                        .publish(Event::now(EventKind::ActivationDropped).with_slot(slot_id));
                    return;
                }
            }
        };

        self.inner.router.register(&slot_id, &handlers);
        self.inner.coordinator.start(&config, vec![slot_id], vec![handle]);
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.lock();
        f.debug_struct("Engine")
            .field("lifecycle", &st.lifecycle)
            .field("registered", &st.registry.len())
            .field("pending", &st.queue.len())
            .finish()
    }
}
