//! Size-mapping cache and viewport filtering.

use std::collections::HashMap;

use crate::collaborators::SizeMappingHandle;
use crate::config::SizeMappingEntry;

/// Viewport dimensions in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Returns `true` if the first entry whose minimum viewport fits `viewport`
/// allows at least one size.
///
/// Entries are scanned top to bottom. No fitting entry means the slot is not
/// shown at this viewport.
pub fn fits_viewport(entries: &[SizeMappingEntry], viewport: Viewport) -> bool {
    entries
        .iter()
        .find(|e| viewport.width >= e.viewport.0 && viewport.height >= e.viewport.1)
        .is_some_and(|e| !e.sizes.is_empty())
}

/// Size-mapping name → handle built by the ad server during setup.
#[derive(Debug, Default)]
pub struct SizeMappingCache {
    built: HashMap<String, SizeMappingHandle>,
}

impl SizeMappingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, handle: SizeMappingHandle) {
        self.built.insert(name.into(), handle);
    }

    pub fn get(&self, name: &str) -> Option<SizeMappingHandle> {
        self.built.get(name).copied()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.built.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.built.is_empty()
    }

    pub fn clear(&mut self) {
        self.built.clear();
    }
}
