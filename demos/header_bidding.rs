//! # Header bidding walkthrough
//!
//! Drives an [`Engine`] against in-memory collaborators that log every call:
//!
//! 1. `top` is activated before setup and gets buffered.
//! 2. `setup()` defines both slots and replays the buffer as one batch.
//! 3. A custom `expand` message reaches the callback registered for `top`.
//! 4. `sidebar` is activated; the exchange never answers for it, so the
//!    failsafe refreshes it.
//! 5. `teardown()` destroys the slots.
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example header_bidding --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bidvisor::{
    AdServer, AdUnit, BidsBack, Collaborators, Config, Engine, EventCallback, EventHandlers,
    ExchangeClient, ExchangeSlot, LazyLoadConfig, LogWriter, MessageChannel, Orchestrator,
    SizeMappingEntry, SizeMappingHandle, SlotDefinition, SlotHandle, Subscribe, TargetingValue,
    TaskQueue, Viewport,
};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"{
    "path": "/19968336/header-bid-tag",
    "slots": [
        { "id": "top", "sizes": [[728, 90]], "prebid": [{ "mediaTypes": { "banner": { "sizes": [[728, 90]] } }, "bids": [{ "bidder": "appnexus", "params": { "placementId": 13144370 } }] }] },
        { "id": "sidebar", "sizes": [[300, 250]], "amazon": true }
    ],
    "targeting": { "section": "news" },
    "customEvents": { "expand": { "eventMessagePrefix": "expand:" } },
    "amazon": { "pubID": "1234", "adServer": "googletag" },
    "globalFailSafeTimeout": 500
}"#;

#[derive(Default)]
struct PageAdServer {
    next: AtomicU64,
}

impl AdServer for PageAdServer {
    fn viewport(&self) -> Viewport {
        Viewport::new(1440, 900)
    }

    fn build_size_mapping(&self, _entries: &[SizeMappingEntry]) -> anyhow::Result<SizeMappingHandle> {
        Ok(SizeMappingHandle::new(self.next.fetch_add(1, Ordering::Relaxed)))
    }

    fn define_slot(&self, slot: &SlotDefinition<'_>) -> anyhow::Result<SlotHandle> {
        info!(id = slot.id, path = slot.path, "ad server: define slot");
        Ok(SlotHandle::new(self.next.fetch_add(1, Ordering::Relaxed)))
    }

    fn define_out_of_page_slot(&self, path: &str, id: &str) -> anyhow::Result<SlotHandle> {
        info!(id, path, "ad server: define out-of-page slot");
        Ok(SlotHandle::new(self.next.fetch_add(1, Ordering::Relaxed)))
    }

    fn set_page_targeting(&self, key: &str, value: &TargetingValue) -> anyhow::Result<()> {
        info!(key, ?value, "ad server: page targeting");
        Ok(())
    }

    fn disable_initial_load(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn enable_single_request(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn enable_lazy_load(&self, _config: &LazyLoadConfig) -> anyhow::Result<()> {
        Ok(())
    }

    fn enable_services(&self) -> anyhow::Result<()> {
        info!("ad server: services enabled");
        Ok(())
    }

    fn display(&self, id: &str) -> anyhow::Result<()> {
        info!(id, "ad server: display");
        Ok(())
    }

    fn refresh(&self, slots: Option<&[SlotHandle]>) -> anyhow::Result<()> {
        let raw: Vec<u64> = slots.unwrap_or_default().iter().map(|h| h.raw()).collect();
        info!(?raw, "ad server: refresh");
        Ok(())
    }

    fn destroy_slots(&self) -> anyhow::Result<()> {
        info!("ad server: destroy slots");
        Ok(())
    }
}

/// Answers every bid request after a short auction.
struct AuctionOrchestrator;

impl Orchestrator for AuctionOrchestrator {
    fn add_ad_units(&self, units: Vec<AdUnit>) -> anyhow::Result<()> {
        info!(units = units.len(), "orchestrator: ad units added");
        Ok(())
    }

    fn set_config(&self, _config: &Value) -> anyhow::Result<()> {
        Ok(())
    }

    fn remove_ad_unit(&self, code: &str) -> anyhow::Result<()> {
        info!(code, "orchestrator: ad unit removed");
        Ok(())
    }

    fn request_bids(&self, codes: Vec<String>, done: BidsBack) -> anyhow::Result<()> {
        info!(?codes, "orchestrator: auction started");
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(80)).await;
            done();
        });
        Ok(())
    }

    fn set_targeting(&self, codes: &[String]) -> anyhow::Result<()> {
        info!(?codes, "orchestrator: targeting set");
        Ok(())
    }
}

/// Never calls back, leaving the batch to the failsafe.
struct SilentExchange;

impl ExchangeClient for SilentExchange {
    fn load_script(&self) -> anyhow::Result<()> {
        info!("exchange: script loaded");
        Ok(())
    }

    fn init(&self, pub_id: &str, ad_server: &str) -> anyhow::Result<()> {
        info!(pub_id, ad_server, "exchange: initialized");
        Ok(())
    }

    fn fetch_bids(&self, slots: Vec<ExchangeSlot>, _done: BidsBack) -> anyhow::Result<()> {
        let ids: Vec<String> = slots.into_iter().map(|s| s.slot_id).collect();
        info!(?ids, "exchange: bids requested, never answering");
        Ok(())
    }

    fn set_display_bids(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let messages = MessageChannel::default();
    let collaborators = Collaborators {
        ad_server: Arc::new(PageAdServer::default()),
        ad_server_queue: TaskQueue::spawn("ad_server"),
        orchestrator: Arc::new(AuctionOrchestrator),
        orchestrator_queue: TaskQueue::spawn("orchestrator"),
        exchange: Arc::new(SilentExchange),
        messages: messages.clone(),
    };

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let engine = Engine::builder(collaborators)
        .with_config(Config::from_json(CONFIG)?)
        .with_subscribers(subs)
        .build();

    let expand: EventCallback = Arc::new(|| info!("page: top creative asked to expand"));
    let mut handlers = EventHandlers::new();
    handlers.insert("expand".to_string(), expand);
    engine.activate("top", handlers);

    engine.setup().await?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    messages.deliver("expand:top");
    tokio::time::sleep(Duration::from_millis(50)).await;

    engine.activate("sidebar", EventHandlers::new());
    tokio::time::sleep(Duration::from_millis(700)).await;

    engine.teardown().await?;
    info!(state = %engine.state(), slots = ?engine.registered_slots(), "done");

    // Let subscriber workers flush.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
