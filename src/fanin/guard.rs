use std::sync::atomic::{AtomicBool, Ordering};

/// Compare-and-set-once latch.
///
/// Exactly one call to [`try_fire`](OnceGuard::try_fire) ever returns `true`,
/// no matter how many threads race on it.
#[derive(Debug, Default)]
pub struct OnceGuard {
    fired: AtomicBool,
}

impl OnceGuard {
    pub const fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
        }
    }

    /// Returns `true` for the first caller only.
    pub fn try_fire(&self) -> bool {
        self.fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}
