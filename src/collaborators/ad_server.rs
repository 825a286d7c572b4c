//! Ad-server tag library contract.

use std::collections::BTreeMap;

use crate::config::{AdSize, CollapseEmptyDiv, LazyLoadConfig, SizeMappingEntry, TargetingValue};
use crate::slots::Viewport;

/// Opaque slot reference minted by the ad server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotHandle(u64);

impl SlotHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Opaque size-mapping reference minted by the ad server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SizeMappingHandle(u64);

impl SizeMappingHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Everything the ad server needs to define one standard slot.
#[derive(Clone, Debug)]
pub struct SlotDefinition<'a> {
    pub id: &'a str,
    pub path: &'a str,
    pub sizes: &'a [AdSize],
    pub size_mapping: Option<SizeMappingHandle>,
    pub collapse_empty_div: Option<CollapseEmptyDiv>,
    pub targeting: &'a BTreeMap<String, TargetingValue>,
}

/// Ad-server tag library.
///
/// All methods are invoked from inside the ad-server command queue, except
/// [`viewport`](AdServer::viewport) which is also read there.
pub trait AdServer: Send + Sync + 'static {
    /// Current viewport, used to skip slots whose size mapping allows no size.
    fn viewport(&self) -> Viewport;

    fn build_size_mapping(&self, entries: &[SizeMappingEntry]) -> anyhow::Result<SizeMappingHandle>;

    fn define_slot(&self, slot: &SlotDefinition<'_>) -> anyhow::Result<SlotHandle>;

    fn define_out_of_page_slot(&self, path: &str, id: &str) -> anyhow::Result<SlotHandle>;

    fn set_page_targeting(&self, key: &str, value: &TargetingValue) -> anyhow::Result<()>;

    /// Stops the ad server from fetching on `display`; fetching happens on refresh.
    fn disable_initial_load(&self) -> anyhow::Result<()>;

    fn enable_single_request(&self) -> anyhow::Result<()>;

    fn enable_lazy_load(&self, config: &LazyLoadConfig) -> anyhow::Result<()>;

    fn enable_services(&self) -> anyhow::Result<()>;

    fn display(&self, id: &str) -> anyhow::Result<()>;

    /// Requests ads for `slots`, or for every slot when `None`.
    fn refresh(&self, slots: Option<&[SlotHandle]>) -> anyhow::Result<()>;

    fn destroy_slots(&self) -> anyhow::Result<()>;
}
