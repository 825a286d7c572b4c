//! # bidvisor
//!
//! **Bidvisor** coordinates header bidding for a page: it sets up an
//! ad-server tag library and two bidding services (a real-time bidding
//! orchestrator and an exchange client), turns slot activations into bid
//! batches, and guarantees every batch triggers exactly one ad-server refresh.
//!
//! The engine never talks to those services directly. Every call goes through
//! a push-only command queue owned by the collaborator, bridged into a future
//! that settles once the queue ran it.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   activate(slot, handlers)            setup() / teardown()
//!            │                                   │
//!            ▼                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Engine (lifecycle controller)                                    │
//! │  - SlotRegistry      (slot id → handle, swapped in by setup)      │
//! │  - ActivationQueue   (activations before the registry is ready)   │
//! │  - CustomEventRouter (message prefix → per-slot callbacks)        │
//! │  - BidCoordinator    (one FanInState + failsafe per batch)        │
//! └──────┬──────────────────────┬───────────────────────┬─────────────┘
//!        │ bridge::enqueue      │ bridge::enqueue       │ direct calls
//!        ▼                      ▼                       ▼
//!  [ad-server queue]     [orchestrator queue]     ExchangeClient
//!        │                      │                       │
//!   AdServer (tag lib)     Orchestrator            fetch_bids(done)
//!
//! Events: Engine / batches / router / bridge ── publish ──► Bus ──► SubscriberSet
//! ```
//!
//! ### One batch
//! ```text
//! start(batch) ─┬─► failsafe timer ─────────────────────────────┐
//!               ├─► exchange.fetch_bids ── done ─► mark(Exchange)     ├─► OnceGuard ─► refresh(batch handles)
//!               └─► orchestrator.request_bids ── done ─► mark(Orch.)  ┘   (fan-in or failsafe, never both)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Engine**        | Setup/teardown sequencing, activation, buffering.            | [`Engine`], [`EngineBuilder`]               |
//! | **Collaborators** | Contracts for the ad server and the bidding services.        | [`AdServer`], [`Orchestrator`], [`ExchangeClient`] |
//! | **Bridge**        | Push-only queues turned into settle-only futures.            | [`CommandQueue`], [`TaskQueue`], [`bridge::enqueue`] |
//! | **Fan-in**        | Exactly-once refresh per batch.                              | [`FanInState`], [`OnceGuard`]               |
//! | **Custom events** | Message-channel routing to per-slot callbacks.               | [`MessageChannel`], [`EventHandlers`]       |
//! | **Subscriber API**| Observe engine events (logging, metrics).                    | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed errors for the bridge, engine and configuration.       | [`BridgeError`], [`EngineError`], [`ConfigError`] |
//! | **Configuration** | Serde-loaded slot and service settings.                      | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```no_run
//! use bidvisor::{Collaborators, Config, Engine, EventHandlers};
//!
//! async fn run(collaborators: Collaborators) -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_json(
//!         r#"{
//!             "path": "/19968336/home",
//!             "slots": [{ "id": "top", "sizes": [[728, 90]], "amazon": true }],
//!             "globalFailSafeTimeout": 1500
//!         }"#,
//!     )?;
//!
//!     let engine = Engine::builder(collaborators)
//!         .with_config(config)
//!         .with_error_handler(|err| eprintln!("ad stack: {err}"))
//!         .build();
//!
//!     // Buffered until setup has defined the slots, then bid on as one batch.
//!     engine.activate("top", EventHandlers::new());
//!     engine.setup().await?;
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod collaborators;
mod config;
mod core;
mod error;
mod events;
mod fanin;
mod router;
mod slots;
mod subscribers;

#[cfg(test)]
mod testkit;

// ---- Public re-exports ----

pub use bridge::{CommandQueue, ErrorHandler, TaskQueue};
pub use collaborators::{
    AdServer, BidsBack, Collaborators, ExchangeClient, ExchangeLoader, Orchestrator, Plugin,
    SizeMappingHandle, SlotDefinition, SlotHandle,
};
pub use config::{
    AdServerConfig, AdSize, CollapseEmptyDiv, Config, CustomEventConfig, DEFAULT_BUS_CAPACITY,
    DEFAULT_FAILSAFE_TIMEOUT_MS, ExchangeConfig, LazyLoadConfig, OrchestratorBidConfig,
    OutOfPageSlotConfig, RequestMode, SizeMappingEntry, SlotConfig, TargetingValue,
};
pub use core::{Engine, EngineBuilder, LifecycleState};
pub use error::{BridgeError, ConfigError, EngineError};
pub use events::{Bus, Event, EventKind};
pub use fanin::{Batch, Bidder, FanInState, OnceGuard, RefreshTrigger};
pub use router::{EventCallback, EventHandlers, MessageChannel, resolve as resolve_custom_event};
pub use slots::{AdUnit, ExchangeSlot, Viewport, fits_viewport};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
