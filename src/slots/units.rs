//! Bidding-service views of the slot configuration.

use serde_json::Value;

use crate::config::{AdSize, Config};

/// Orchestrator ad unit: one per orchestrator bid entry of a slot.
#[derive(Clone, Debug, PartialEq)]
pub struct AdUnit {
    /// Slot id.
    pub code: String,
    pub media_types: Value,
    pub bids: Vec<Value>,
}

/// Exchange auction slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeSlot {
    pub slot_id: String,
    /// Resolved ad-unit path.
    pub slot_name: String,
    pub sizes: Vec<AdSize>,
}

/// Ad units for every slot with orchestrator bid configuration, in slot order.
pub fn ad_units(config: &Config) -> Vec<AdUnit> {
    config
        .slots
        .iter()
        .flat_map(|slot| {
            slot.orchestrator.iter().map(move |bid| AdUnit {
                code: slot.id.clone(),
                media_types: bid.media_types.clone(),
                bids: bid.bids.clone(),
            })
        })
        .collect()
}

/// Exchange slots for the exchange-enabled slots among `slot_ids`, in `slot_ids` order.
///
/// Ids that are unknown or not exchange-enabled are skipped; repeated ids are
/// requested once.
pub fn exchange_slots(config: &Config, slot_ids: &[String]) -> Vec<ExchangeSlot> {
    let mut out: Vec<ExchangeSlot> = Vec::new();
    for id in slot_ids {
        if out.iter().any(|s| &s.slot_id == id) {
            continue;
        }
        let Some(slot) = config.slot(id).filter(|s| s.exchange) else {
            continue;
        };
        out.push(ExchangeSlot {
            slot_id: slot.id.clone(),
            slot_name: config.path_of(slot.path.as_deref()).to_string(),
            sizes: slot.sizes.clone(),
        });
    }
    out
}
