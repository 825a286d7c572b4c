//! # Slot state owned by the engine.
//!
//! - [`registry`]: slot id → [`SlotHandle`](crate::SlotHandle), populated by setup in one swap;
//! - [`activation`]: FIFO buffer of activations that arrived before the registry was populated;
//! - [`size_mapping`]: size-mapping cache and viewport filtering;
//! - [`units`]: ad units and exchange slots derived from slot configuration.

mod activation;
mod registry;
mod size_mapping;
mod units;

pub use activation::{ActivationQueue, ActivationRequest};
pub use registry::SlotRegistry;
pub use size_mapping::{SizeMappingCache, Viewport, fits_viewport};
pub use units::{AdUnit, ExchangeSlot, ad_units, exchange_slots};
