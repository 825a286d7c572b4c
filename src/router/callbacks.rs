//! # Custom event callback table.
//!
//! `event id → slot id → callback`. Entries accumulate as activations register
//! handlers; a later registration for the same pair replaces the earlier one.
//! Nothing is pruned until the whole table is cleared on teardown.

use std::collections::HashMap;
use std::sync::Arc;

/// Callback invoked when a custom event targets a slot.
pub type EventCallback = Arc<dyn Fn() + Send + Sync>;

/// Handlers passed with one activation: event id → callback.
pub type EventHandlers = HashMap<String, EventCallback>;

#[derive(Default)]
pub struct CallbackTable {
    by_event: HashMap<String, HashMap<String, EventCallback>>,
}

impl CallbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every handler of `handlers` for `slot_id`.
    pub fn merge(&mut self, slot_id: &str, handlers: &EventHandlers) {
        for (event_id, callback) in handlers {
            self.by_event
                .entry(event_id.clone())
                .or_default()
                .insert(slot_id.to_string(), Arc::clone(callback));
        }
    }

    pub fn get(&self, event_id: &str, slot_id: &str) -> Option<EventCallback> {
        self.by_event.get(event_id)?.get(slot_id).cloned()
    }

    /// Total number of `(event, slot)` entries.
    pub fn len(&self) -> usize {
        self.by_event.values().map(HashMap::len).sum()
    }

    pub fn clear(&mut self) {
        self.by_event.clear();
    }
}

impl std::fmt::Debug for CallbackTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackTable")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting(counter: &Arc<AtomicUsize>, by: usize) -> EventCallback {
        let counter = Arc::clone(counter);
        Arc::new(move || {
            counter.fetch_add(by, Ordering::SeqCst);
        })
    }

    #[test]
    fn last_writer_wins_per_event_and_slot() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut table = CallbackTable::new();

        table.merge("top", &HashMap::from([("expand".to_string(), counting(&hits, 1))]));
        table.merge("top", &HashMap::from([("expand".to_string(), counting(&hits, 10))]));
        table.merge("side", &HashMap::from([("expand".to_string(), counting(&hits, 100))]));
        assert_eq!(table.len(), 2);

        (table.get("expand", "top").unwrap())();
        assert_eq!(hits.load(Ordering::SeqCst), 10);
        assert!(table.get("expand", "bottom").is_none());
        assert!(table.get("collapse", "top").is_none());

        table.clear();
        assert_eq!(table.len(), 0);
    }
}
