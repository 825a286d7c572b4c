//! Real-time bidding orchestrator contract.

use serde_json::Value;

use super::BidsBack;
use crate::slots::AdUnit;

/// Real-time bidding orchestrator.
///
/// Invoked from inside the orchestrator command queue, except
/// [`set_targeting`](Orchestrator::set_targeting), which the engine runs on
/// the ad-server queue because it writes into the ad server.
pub trait Orchestrator: Send + Sync + 'static {
    fn add_ad_units(&self, units: Vec<AdUnit>) -> anyhow::Result<()>;

    /// Applies the orchestrator settings from [`Config::orchestrator`](crate::Config::orchestrator).
    fn set_config(&self, config: &Value) -> anyhow::Result<()>;

    fn remove_ad_unit(&self, code: &str) -> anyhow::Result<()>;

    /// Starts an auction for `codes`; `done` must be called once bids are back.
    fn request_bids(&self, codes: Vec<String>, done: BidsBack) -> anyhow::Result<()>;

    /// Copies the auction results for `codes` into ad-server targeting.
    fn set_targeting(&self, codes: &[String]) -> anyhow::Result<()>;
}
