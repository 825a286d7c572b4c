//! Per-batch fan-in state.

use std::sync::atomic::{AtomicBool, Ordering};

use super::guard::OnceGuard;
use crate::collaborators::SlotHandle;

/// Bidding service taking part in a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bidder {
    /// Exchange bidding client.
    Exchange,
    /// Real-time bidding orchestrator.
    Orchestrator,
}

impl Bidder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bidder::Exchange => "exchange",
            Bidder::Orchestrator => "orchestrator",
        }
    }
}

/// What fired a batch's refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshTrigger {
    /// Every bidding service reported back.
    FanIn,
    /// The failsafe timer elapsed first.
    Failsafe,
}

impl RefreshTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshTrigger::FanIn => "fan-in",
            RefreshTrigger::Failsafe => "failsafe",
        }
    }
}

/// Completion flags of one batch plus its single-fire refresh guard.
///
/// Created per batch and never reused.
#[derive(Debug)]
pub struct FanInState {
    exchange: AtomicBool,
    orchestrator: AtomicBool,
    guard: OnceGuard,
}

impl FanInState {
    /// When the exchange is not expected its flag starts set.
    pub fn new(exchange_expected: bool) -> Self {
        Self {
            exchange: AtomicBool::new(!exchange_expected),
            orchestrator: AtomicBool::new(false),
            guard: OnceGuard::new(),
        }
    }

    fn flag(&self, bidder: Bidder) -> &AtomicBool {
        match bidder {
            Bidder::Exchange => &self.exchange,
            Bidder::Orchestrator => &self.orchestrator,
        }
    }

    /// Marks `bidder` done and returns whether every bidder is now done.
    pub fn mark(&self, bidder: Bidder) -> bool {
        self.flag(bidder).store(true, Ordering::Release);
        self.is_complete()
    }

    pub fn is_done(&self, bidder: Bidder) -> bool {
        self.flag(bidder).load(Ordering::Acquire)
    }

    pub fn is_complete(&self) -> bool {
        self.is_done(Bidder::Exchange) && self.is_done(Bidder::Orchestrator)
    }

    pub fn guard(&self) -> &OnceGuard {
        &self.guard
    }
}

/// Slots bid on together and refreshed together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    pub id: u64,
    /// Slot ids in activation order; duplicates allowed.
    pub slot_ids: Vec<String>,
    /// Handles of `slot_ids`, same order.
    pub handles: Vec<SlotHandle>,
}

impl Batch {
    /// Slot ids with duplicates removed, first occurrence wins.
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = Vec::with_capacity(self.slot_ids.len());
        for id in &self.slot_ids {
            if !codes.contains(id) {
                codes.push(id.clone());
            }
        }
        codes
    }

    /// Handles with duplicates removed, first occurrence wins.
    pub fn refresh_handles(&self) -> Vec<SlotHandle> {
        let mut handles: Vec<SlotHandle> = Vec::with_capacity(self.handles.len());
        for handle in &self.handles {
            if !handles.contains(handle) {
                handles.push(*handle);
            }
        }
        handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_when_both_bidders_marked() {
        let state = FanInState::new(true);
        assert!(!state.mark(Bidder::Orchestrator));
        assert!(state.mark(Bidder::Exchange));
        assert!(state.is_complete());
    }

    #[test]
    fn exchange_flag_preset_when_not_expected() {
        let state = FanInState::new(false);
        assert!(state.is_done(Bidder::Exchange));
        assert!(state.mark(Bidder::Orchestrator));
    }

    #[test]
    fn codes_deduplicate_in_order() {
        let batch = Batch {
            id: 1,
            slot_ids: vec!["b".into(), "a".into(), "b".into()],
            handles: vec![SlotHandle::new(2), SlotHandle::new(1), SlotHandle::new(2)],
        };
        assert_eq!(batch.codes(), vec!["b".to_string(), "a".to_string()]);
        assert_eq!(
            batch.refresh_handles(),
            vec![SlotHandle::new(2), SlotHandle::new(1)]
        );
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(Bidder::Exchange.as_str(), "exchange");
        assert_eq!(RefreshTrigger::FanIn.as_str(), "fan-in");
    }
}
