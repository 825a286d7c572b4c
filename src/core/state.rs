use std::sync::Arc;

use crate::config::Config;
use crate::core::LifecycleState;
use crate::slots::{ActivationQueue, SizeMappingCache, SlotRegistry};

/// Mutable engine state, guarded by one mutex.
///
/// The lock is never held across an `.await`, a collaborator call or a user
/// callback.
#[derive(Debug, Default)]
pub(crate) struct EngineState {
    pub(crate) config: Option<Arc<Config>>,
    pub(crate) lifecycle: LifecycleState,
    pub(crate) registry: SlotRegistry,
    pub(crate) size_mappings: SizeMappingCache,
    pub(crate) queue: ActivationQueue,
}

impl EngineState {
    /// Resets everything a setup/teardown cycle populated; keeps the configuration.
    pub(crate) fn reset(&mut self) {
        self.lifecycle = LifecycleState::Uninitialized;
        self.registry.clear();
        self.size_mappings.clear();
        self.queue.clear();
    }
}
