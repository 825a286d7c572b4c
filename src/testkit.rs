//! Recording fakes and a manually drained queue for unit tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::bail;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::bridge::{Command, CommandQueue, ErrorHandler};
use crate::collaborators::{
    AdServer, BidsBack, Collaborators, ExchangeClient, Orchestrator, SizeMappingHandle,
    SlotDefinition, SlotHandle,
};
use crate::config::{
    AdSize, Config, CustomEventConfig, ExchangeConfig, LazyLoadConfig, OrchestratorBidConfig,
    SizeMappingEntry, SlotConfig, TargetingValue,
};
use crate::core::{Engine, EngineBuilder};
use crate::error::BridgeError;
use crate::events::{Bus, Event};
use crate::router::MessageChannel;
use crate::slots::{AdUnit, ExchangeSlot, Viewport};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap()
}

/// Queue that only runs commands when the test drains it.
pub(crate) struct ManualQueue {
    name: &'static str,
    pending: Mutex<VecDeque<Command>>,
}

impl ManualQueue {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            pending: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Runs commands until the queue is empty, including ones pushed meanwhile.
    pub(crate) fn drain(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = lock(&self.pending).pop_front();
            match next {
                Some(command) => {
                    command();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Drops every pending command without running it.
    pub(crate) fn discard(&self) {
        lock(&self.pending).clear();
    }
}

impl CommandQueue for ManualQueue {
    fn push(&self, command: Command) {
        lock(&self.pending).push_back(command);
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Ad server recording every call as `"op"` or `"op:arg"`.
pub(crate) struct FakeAdServer {
    viewport: Mutex<Viewport>,
    calls: Mutex<Vec<String>>,
    defined: Mutex<Vec<(String, SlotHandle)>>,
    refreshes: Mutex<Vec<Option<Vec<SlotHandle>>>>,
    fail_on: Mutex<Option<String>>,
    next: AtomicU64,
}

impl Default for FakeAdServer {
    fn default() -> Self {
        Self {
            viewport: Mutex::new(Viewport::new(1280, 800)),
            calls: Mutex::new(Vec::new()),
            defined: Mutex::new(Vec::new()),
            refreshes: Mutex::new(Vec::new()),
            fail_on: Mutex::new(None),
            next: AtomicU64::new(1),
        }
    }
}

impl FakeAdServer {
    pub(crate) fn set_viewport(&self, viewport: Viewport) {
        *lock(&self.viewport) = viewport;
    }

    /// Makes the call recorded as `call` fail.
    pub(crate) fn fail_on(&self, call: &str) {
        *lock(&self.fail_on) = Some(call.to_string());
    }

    /// Recorded calls, refreshes excluded.
    pub(crate) fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub(crate) fn refreshes(&self) -> Vec<Option<Vec<SlotHandle>>> {
        lock(&self.refreshes).clone()
    }

    /// Handle of the most recent definition of `id`.
    pub(crate) fn handle_of(&self, id: &str) -> SlotHandle {
        lock(&self.defined)
            .iter()
            .rev()
            .find(|(defined, _)| defined == id)
            .map(|(_, handle)| *handle)
            .unwrap()
    }

    fn record(&self, call: String) -> anyhow::Result<()> {
        let fail = lock(&self.fail_on).as_deref() == Some(call.as_str());
        lock(&self.calls).push(call.clone());
        if fail {
            bail!("{call} rejected");
        }
        Ok(())
    }

    fn mint(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

impl AdServer for FakeAdServer {
    fn viewport(&self) -> Viewport {
        *lock(&self.viewport)
    }

    fn build_size_mapping(&self, _entries: &[SizeMappingEntry]) -> anyhow::Result<SizeMappingHandle> {
        self.record("build_size_mapping".into())?;
        Ok(SizeMappingHandle::new(self.mint()))
    }

    fn define_slot(&self, slot: &SlotDefinition<'_>) -> anyhow::Result<SlotHandle> {
        self.record(format!("define_slot:{}", slot.id))?;
        let handle = SlotHandle::new(self.mint());
        lock(&self.defined).push((slot.id.to_string(), handle));
        Ok(handle)
    }

    fn define_out_of_page_slot(&self, _path: &str, id: &str) -> anyhow::Result<SlotHandle> {
        self.record(format!("define_out_of_page_slot:{id}"))?;
        let handle = SlotHandle::new(self.mint());
        lock(&self.defined).push((id.to_string(), handle));
        Ok(handle)
    }

    fn set_page_targeting(&self, key: &str, _value: &TargetingValue) -> anyhow::Result<()> {
        self.record(format!("set_page_targeting:{key}"))
    }

    fn disable_initial_load(&self) -> anyhow::Result<()> {
        self.record("disable_initial_load".into())
    }

    fn enable_single_request(&self) -> anyhow::Result<()> {
        self.record("enable_single_request".into())
    }

    fn enable_lazy_load(&self, _config: &LazyLoadConfig) -> anyhow::Result<()> {
        self.record("enable_lazy_load".into())
    }

    fn enable_services(&self) -> anyhow::Result<()> {
        self.record("enable_services".into())
    }

    fn display(&self, id: &str) -> anyhow::Result<()> {
        self.record(format!("display:{id}"))
    }

    fn refresh(&self, slots: Option<&[SlotHandle]>) -> anyhow::Result<()> {
        lock(&self.refreshes).push(slots.map(<[SlotHandle]>::to_vec));
        Ok(())
    }

    fn destroy_slots(&self) -> anyhow::Result<()> {
        self.record("destroy_slots".into())
    }
}

/// Orchestrator holding bid requests until [`respond_all`](Self::respond_all).
#[derive(Default)]
pub(crate) struct FakeOrchestrator {
    calls: Mutex<Vec<String>>,
    requests: Mutex<Vec<Vec<String>>>,
    targeted: Mutex<Vec<Vec<String>>>,
    pending: Mutex<Vec<BidsBack>>,
}

impl FakeOrchestrator {
    /// Setup/teardown calls; bid requests are tracked separately.
    pub(crate) fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub(crate) fn requests(&self) -> Vec<Vec<String>> {
        lock(&self.requests).clone()
    }

    pub(crate) fn targeted(&self) -> Vec<Vec<String>> {
        lock(&self.targeted).clone()
    }

    /// Invokes every outstanding bids-back callback.
    pub(crate) fn respond_all(&self) -> usize {
        let pending: Vec<BidsBack> = lock(&self.pending).drain(..).collect();
        let n = pending.len();
        for done in pending {
            done();
        }
        n
    }
}

impl Orchestrator for FakeOrchestrator {
    fn add_ad_units(&self, units: Vec<AdUnit>) -> anyhow::Result<()> {
        let codes: Vec<String> = units.into_iter().map(|u| u.code).collect();
        lock(&self.calls).push(format!("add_ad_units:{}", codes.join(",")));
        Ok(())
    }

    fn set_config(&self, _config: &Value) -> anyhow::Result<()> {
        lock(&self.calls).push("set_config".into());
        Ok(())
    }

    fn remove_ad_unit(&self, code: &str) -> anyhow::Result<()> {
        lock(&self.calls).push(format!("remove_ad_unit:{code}"));
        Ok(())
    }

    fn request_bids(&self, codes: Vec<String>, done: BidsBack) -> anyhow::Result<()> {
        lock(&self.requests).push(codes);
        lock(&self.pending).push(done);
        Ok(())
    }

    fn set_targeting(&self, codes: &[String]) -> anyhow::Result<()> {
        lock(&self.targeted).push(codes.to_vec());
        Ok(())
    }
}

/// Exchange client holding bid requests until [`respond_all`](Self::respond_all).
#[derive(Default)]
pub(crate) struct FakeExchange {
    loads: AtomicUsize,
    fail_next_load: AtomicBool,
    fail_fetches: AtomicBool,
    display_bids: AtomicUsize,
    inits: Mutex<Vec<(String, String)>>,
    fetches: Mutex<Vec<Vec<String>>>,
    pending: Mutex<Vec<BidsBack>>,
}

impl FakeExchange {
    /// Number of successful script loads.
    pub(crate) fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_next_load(&self) {
        self.fail_next_load.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_fetches(&self) {
        self.fail_fetches.store(true, Ordering::SeqCst);
    }

    pub(crate) fn display_bids(&self) -> usize {
        self.display_bids.load(Ordering::SeqCst)
    }

    pub(crate) fn inits(&self) -> Vec<(String, String)> {
        lock(&self.inits).clone()
    }

    /// Slot ids of every fetch, in call order.
    pub(crate) fn fetches(&self) -> Vec<Vec<String>> {
        lock(&self.fetches).clone()
    }

    pub(crate) fn respond_all(&self) -> usize {
        let pending: Vec<BidsBack> = lock(&self.pending).drain(..).collect();
        let n = pending.len();
        for done in pending {
            done();
        }
        n
    }
}

impl ExchangeClient for FakeExchange {
    fn load_script(&self) -> anyhow::Result<()> {
        if self.fail_next_load.swap(false, Ordering::SeqCst) {
            bail!("script blocked");
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn init(&self, pub_id: &str, ad_server: &str) -> anyhow::Result<()> {
        lock(&self.inits).push((pub_id.to_string(), ad_server.to_string()));
        Ok(())
    }

    fn fetch_bids(&self, slots: Vec<ExchangeSlot>, done: BidsBack) -> anyhow::Result<()> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            bail!("exchange unavailable");
        }
        lock(&self.fetches).push(slots.into_iter().map(|s| s.slot_id).collect());
        lock(&self.pending).push(done);
        Ok(())
    }

    fn set_display_bids(&self) -> anyhow::Result<()> {
        self.display_bids.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// One of every fake, plus a bus and an error sink.
pub(crate) struct Fakes {
    pub(crate) ad_server: Arc<FakeAdServer>,
    pub(crate) ad_server_queue: Arc<ManualQueue>,
    pub(crate) orchestrator: Arc<FakeOrchestrator>,
    pub(crate) orchestrator_queue: Arc<ManualQueue>,
    pub(crate) exchange: Arc<FakeExchange>,
    pub(crate) messages: MessageChannel,
    pub(crate) bus: Bus,
    events: Mutex<broadcast::Receiver<Event>>,
    errors: Arc<Mutex<Vec<BridgeError>>>,
}

impl Fakes {
    pub(crate) fn new() -> Self {
        let bus = Bus::new(256);
        Self {
            ad_server: Arc::new(FakeAdServer::default()),
            ad_server_queue: Arc::new(ManualQueue::new("ad_server")),
            orchestrator: Arc::new(FakeOrchestrator::default()),
            orchestrator_queue: Arc::new(ManualQueue::new("orchestrator")),
            exchange: Arc::new(FakeExchange::default()),
            messages: MessageChannel::default(),
            events: Mutex::new(bus.subscribe()),
            bus,
            errors: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn collaborators(&self) -> Collaborators {
        Collaborators {
            ad_server: self.ad_server.clone(),
            ad_server_queue: self.ad_server_queue.clone(),
            orchestrator: self.orchestrator.clone(),
            orchestrator_queue: self.orchestrator_queue.clone(),
            exchange: self.exchange.clone(),
            messages: self.messages.clone(),
        }
    }

    pub(crate) fn error_handler(&self) -> ErrorHandler {
        let sink = Arc::clone(&self.errors);
        Arc::new(move |err: &BridgeError| lock(&sink).push(err.clone()))
    }

    pub(crate) fn errors(&self) -> Vec<BridgeError> {
        lock(&self.errors).clone()
    }

    /// Events published on [`Fakes::bus`] since the last call.
    pub(crate) fn events(&self) -> Vec<Event> {
        drain_events(&mut lock(&self.events))
    }

    /// Drains both queues until neither has work left.
    pub(crate) fn drain(&self) {
        while self.ad_server_queue.drain() + self.orchestrator_queue.drain() > 0 {}
    }
}

pub(crate) fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(ev) => out.push(ev),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => return out,
        }
    }
}

/// An engine wired to [`Fakes`], recording its errors there.
pub(crate) struct Harness {
    pub(crate) engine: Engine,
    pub(crate) fakes: Fakes,
}

impl Harness {
    pub(crate) fn new(config: Config) -> Self {
        Self::with(config, |builder| builder)
    }

    pub(crate) fn with(config: Config, customize: impl FnOnce(EngineBuilder) -> EngineBuilder) -> Self {
        let fakes = Fakes::new();
        let on_error = fakes.error_handler();
        let builder = Engine::builder(fakes.collaborators())
            .with_config(config)
            .with_error_handler(move |err: &BridgeError| on_error(err));
        Self {
            engine: customize(builder).build(),
            fakes,
        }
    }

    /// Drains the queues until `task` finished, then returns its output.
    pub(crate) async fn settle<T>(&self, task: JoinHandle<T>) -> T {
        loop {
            self.fakes.drain();
            if task.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }
        task.await.unwrap()
    }

    pub(crate) async fn setup(&self) {
        let engine = self.engine.clone();
        let task = tokio::spawn(async move { engine.setup().await });
        self.settle(task).await.unwrap();
        self.fakes.drain();
    }

    pub(crate) async fn teardown(&self) {
        let engine = self.engine.clone();
        let task = tokio::spawn(async move { engine.teardown().await });
        self.settle(task).await.unwrap();
        self.fakes.drain();
    }

    /// Lets both bidders answer every outstanding request.
    pub(crate) fn respond_all(&self) {
        self.fakes.orchestrator.respond_all();
        self.fakes.exchange.respond_all();
        self.fakes.drain();
    }
}

/// Slot `A` bids with the orchestrator and the exchange, slot `B` with the
/// orchestrator only. Custom event `expand` maps `"expand:<id>"` to slot `<id>`.
pub(crate) fn two_slot_config() -> Config {
    let banner = |bidder: &str| OrchestratorBidConfig {
        media_types: json!({ "banner": { "sizes": [[300, 250]] } }),
        bids: vec![json!({ "bidder": bidder })],
    };
    Config {
        path: "/19968336/header-bid-tag".into(),
        slots: vec![
            SlotConfig {
                id: "A".into(),
                sizes: vec![AdSize::Fixed(300, 250)],
                orchestrator: vec![banner("appnexus")],
                exchange: true,
                ..SlotConfig::default()
            },
            SlotConfig {
                id: "B".into(),
                sizes: vec![AdSize::Fixed(728, 90)],
                orchestrator: vec![banner("rubicon")],
                ..SlotConfig::default()
            },
        ],
        custom_events: BTreeMap::from([(
            "expand".to_string(),
            CustomEventConfig {
                message_prefix: "expand:".into(),
                slot_id_prefix: String::new(),
            },
        )]),
        exchange: Some(ExchangeConfig {
            pub_id: "1234".into(),
            ad_server: "googletag".into(),
        }),
        ..Config::default()
    }
}
