//! Exchange bidding client contract and its one-time bootstrap guard.

use std::sync::atomic::{AtomicBool, Ordering};

use super::BidsBack;
use crate::slots::ExchangeSlot;

/// Exchange bidding client.
///
/// Unlike the other collaborators it has no command queue; the engine calls
/// it directly and bridges its completion callback onto the ad-server queue.
pub trait ExchangeClient: Send + Sync + 'static {
    /// Injects the client library. Called at most once per successful load.
    fn load_script(&self) -> anyhow::Result<()>;

    fn init(&self, pub_id: &str, ad_server: &str) -> anyhow::Result<()>;

    /// Starts an auction for `slots`; `done` must be called once bids are back.
    fn fetch_bids(&self, slots: Vec<ExchangeSlot>, done: BidsBack) -> anyhow::Result<()>;

    /// Applies the fetched bids to ad-server targeting.
    fn set_display_bids(&self) -> anyhow::Result<()>;
}

/// Guards [`ExchangeClient::load_script`] against double injection.
///
/// A failed load releases the guard so a later setup can retry.
#[derive(Debug, Default)]
pub struct ExchangeLoader {
    loaded: AtomicBool,
}

impl ExchangeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the client once. Returns `Ok(true)` if this call performed the load.
    pub fn ensure_loaded(&self, client: &dyn ExchangeClient) -> anyhow::Result<bool> {
        if self
            .loaded
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }
        if let Err(err) = client.load_script() {
            self.loaded.store(false, Ordering::Release);
            return Err(err);
        }
        Ok(true)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::FakeExchange;

    #[test]
    fn loads_exactly_once() {
        let client = FakeExchange::default();
        let loader = ExchangeLoader::new();

        assert!(loader.ensure_loaded(&client).unwrap());
        assert!(!loader.ensure_loaded(&client).unwrap());
        assert!(loader.is_loaded());
        assert_eq!(client.loads(), 1);
    }

    #[test]
    fn failed_load_can_be_retried() {
        let client = FakeExchange::default();
        client.fail_next_load();
        let loader = ExchangeLoader::new();

        assert!(loader.ensure_loaded(&client).is_err());
        assert!(!loader.is_loaded());
        assert!(loader.ensure_loaded(&client).unwrap());
        assert_eq!(client.loads(), 1);
    }
}
