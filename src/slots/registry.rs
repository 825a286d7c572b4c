//! # Slot registry.
//!
//! Maps slot ids to the handles the ad server returned for them, split into
//! standard and out-of-page slots.
//!
//! ## Rules
//! - Built off to the side during setup and installed with a single swap, so
//!   callers observe it either empty or fully populated.
//! - Cleared by teardown.
//! - "Empty" means both maps are empty; activation buffers only in that case.

use std::collections::HashMap;

use crate::collaborators::SlotHandle;

/// Slot id → handle, for the current setup/teardown cycle.
#[derive(Debug, Default)]
pub struct SlotRegistry {
    slots: HashMap<String, SlotHandle>,
    out_of_page: HashMap<String, SlotHandle>,
    /// Registration order, for stable listings.
    order: Vec<String>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a standard slot; a repeated id keeps the newest handle.
    pub fn insert_slot(&mut self, id: impl Into<String>, handle: SlotHandle) {
        let id = id.into();
        if self.slots.insert(id.clone(), handle).is_none() && !self.out_of_page.contains_key(&id) {
            self.order.push(id);
        }
    }

    /// Registers an out-of-page slot; a repeated id keeps the newest handle.
    pub fn insert_out_of_page(&mut self, id: impl Into<String>, handle: SlotHandle) {
        let id = id.into();
        if self.out_of_page.insert(id.clone(), handle).is_none() && !self.slots.contains_key(&id) {
            self.order.push(id);
        }
    }

    /// Returns the handle of a slot, standard slots first.
    pub fn get(&self, id: &str) -> Option<SlotHandle> {
        self.slots
            .get(id)
            .or_else(|| self.out_of_page.get(id))
            .copied()
    }

    #[cfg(test)]
    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id) || self.out_of_page.contains_key(id)
    }

    #[cfg(test)]
    pub fn is_standard(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty() && self.out_of_page.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Slot ids in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.out_of_page.clear();
        self.order.clear();
    }
}
