//! Engine core: lifecycle controller and activation entry point.
//!
//! The only public API from this module is [`Engine`] (built with
//! [`EngineBuilder`]) and its [`LifecycleState`].
//!
//! Internal modules:
//! - [`engine`]: setup/teardown sequencing and activation buffering;
//! - [`setup`]: the bridged operations run inside collaborator queues;
//! - [`state`]: the mutable state behind the engine's lock;
//! - [`builder`]: wiring of bus, subscribers, router and coordinator.

mod builder;
mod engine;
mod lifecycle;
mod setup;
mod state;

pub use builder::EngineBuilder;
pub use engine::Engine;
pub use lifecycle::LifecycleState;
