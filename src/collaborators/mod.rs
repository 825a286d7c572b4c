//! # External collaborators.
//!
//! The engine never talks to the outside world directly; it drives these
//! contracts, mostly through the command bridge:
//!
//! - [`AdServer`]: ad-server tag library (slot definition, targeting, refresh);
//!   driven through its own command queue.
//! - [`Orchestrator`]: real-time bidding orchestrator; driven through its own
//!   command queue.
//! - [`ExchangeClient`]: exchange bidding client; called directly, bootstrapped
//!   once via [`ExchangeLoader`].
//! - [`Plugin`]: optional lifecycle hooks.
//! - [`MessageChannel`](crate::MessageChannel): the global message channel
//!   consumed by the custom event router.
//!
//! [`Collaborators`] bundles one of each for [`Engine::builder`](crate::Engine::builder).

mod ad_server;
mod exchange;
mod orchestrator;
mod plugin;

use std::sync::Arc;

pub use ad_server::{AdServer, SizeMappingHandle, SlotDefinition, SlotHandle};
pub use exchange::{ExchangeClient, ExchangeLoader};
pub use orchestrator::Orchestrator;
pub use plugin::Plugin;

use crate::bridge::CommandQueue;
use crate::router::MessageChannel;

/// Invoked by a bidding service once its bids for a request are back.
pub type BidsBack = Box<dyn FnOnce() + Send + 'static>;

/// The set of collaborators one engine drives.
#[derive(Clone)]
pub struct Collaborators {
    /// Ad-server tag library.
    pub ad_server: Arc<dyn AdServer>,
    /// Command queue drained by the ad-server tag library.
    pub ad_server_queue: Arc<dyn CommandQueue>,
    /// Real-time bidding orchestrator.
    pub orchestrator: Arc<dyn Orchestrator>,
    /// Command queue drained by the orchestrator.
    pub orchestrator_queue: Arc<dyn CommandQueue>,
    /// Exchange bidding client.
    pub exchange: Arc<dyn ExchangeClient>,
    /// Global message channel for custom events.
    pub messages: MessageChannel,
}
