//! # Engine configuration.
//!
//! Provides [`Config`], the static description of the bidding surface: slots,
//! out-of-page slots, page targeting, size mappings, custom events, ad-server
//! request settings, bidder settings and the global failsafe timeout.
//!
//! Config is used in two ways:
//! 1. **Engine creation**: `Engine::builder(collaborators).with_config(config)`
//! 2. **Late configuration**: [`Engine::set_configuration`](crate::Engine::set_configuration)
//!
//! Every section is optional when deserializing; absent sections fall back to
//! empty values (no bid config, no metadata, no targeting).
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use bidvisor::Config;
//!
//! let cfg = Config::from_json(r#"{
//!     "path": "/1234/home",
//!     "slots": [{ "id": "top", "sizes": [[728, 90]], "exchange": true }],
//!     "adServer": { "requestMode": "SRA" },
//!     "failsafeTimeoutMs": 1500
//! }"#).unwrap();
//!
//! assert!(cfg.single_request());
//! assert_eq!(cfg.failsafe_timeout(), Duration::from_millis(1500));
//! assert!(cfg.targeting.is_empty());
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Default failsafe timeout in milliseconds.
pub const DEFAULT_FAILSAFE_TIMEOUT_MS: u64 = 2_000;

/// Default capacity of the engine event bus.
pub const DEFAULT_BUS_CAPACITY: usize = 1_024;

/// Static configuration of the bidding surface.
///
/// ## Field semantics
/// - `path`: default ad-unit path used by slots without their own `path`
/// - `failsafe_timeout_ms`: per-batch deadline before the ad server is asked regardless
/// - `bus_capacity`: engine event bus ring buffer size (min 1)
/// - `orchestrator`: opaque settings handed to the orchestrator (`{}` when absent)
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Default ad-unit path.
    pub path: String,
    /// Standard slots, in definition/display order.
    pub slots: Vec<SlotConfig>,
    /// Out-of-page slots (interstitials and similar).
    pub out_of_page_slots: Vec<OutOfPageSlotConfig>,
    /// Page-level targeting applied once during setup.
    pub targeting: BTreeMap<String, TargetingValue>,
    /// Free-form page metadata carried for plugins.
    #[serde(alias = "metaData")]
    pub metadata: Map<String, Value>,
    /// Named size mappings referenced by [`SlotConfig::size_mapping_name`].
    pub size_mappings: BTreeMap<String, Vec<SizeMappingEntry>>,
    /// Custom events keyed by event id.
    pub custom_events: BTreeMap<String, CustomEventConfig>,
    /// Ad-server request settings.
    #[serde(alias = "gam")]
    pub ad_server: AdServerConfig,
    /// Orchestrator settings, passed through untouched.
    #[serde(alias = "prebid")]
    pub orchestrator: Value,
    /// Exchange client settings; the exchange is not initialized when absent.
    #[serde(alias = "amazon")]
    pub exchange: Option<ExchangeConfig>,
    /// Failsafe timeout per bid batch, in milliseconds.
    #[serde(alias = "globalFailSafeTimeout")]
    pub failsafe_timeout_ms: u64,
    /// Capacity of the engine event bus.
    pub bus_capacity: usize,
}

impl Config {
    /// Parses a JSON configuration document.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        let mut cfg: Config = serde_json::from_str(doc)?;
        if cfg.orchestrator.is_null() {
            cfg.orchestrator = Value::Object(Map::new());
        }
        Ok(cfg)
    }

    /// Returns the per-batch failsafe timeout.
    #[inline]
    pub fn failsafe_timeout(&self) -> Duration {
        Duration::from_millis(self.failsafe_timeout_ms)
    }

    /// Returns `true` when the ad server should batch slot requests (`"SRA"`).
    #[inline]
    pub fn single_request(&self) -> bool {
        matches!(self.ad_server.request_mode, Some(RequestMode::SingleRequest))
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Resolves the ad-unit path of a slot (its own path or the page default).
    #[inline]
    pub fn path_of<'a>(&'a self, own: Option<&'a str>) -> &'a str {
        own.unwrap_or(&self.path)
    }

    /// Looks up a standard slot by id.
    pub fn slot(&self, id: &str) -> Option<&SlotConfig> {
        self.slots.iter().find(|s| s.id == id)
    }
}

impl Default for Config {
    /// Empty surface:
    ///
    /// - no slots, no targeting, no custom events
    /// - `orchestrator = {}`
    /// - `failsafe_timeout_ms = 2000`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            path: String::new(),
            slots: Vec::new(),
            out_of_page_slots: Vec::new(),
            targeting: BTreeMap::new(),
            metadata: Map::new(),
            size_mappings: BTreeMap::new(),
            custom_events: BTreeMap::new(),
            ad_server: AdServerConfig::default(),
            orchestrator: Value::Object(Map::new()),
            exchange: None,
            failsafe_timeout_ms: DEFAULT_FAILSAFE_TIMEOUT_MS,
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }
}

/// A standard slot.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotConfig {
    /// Unique slot id (also the orchestrator ad-unit code).
    pub id: String,
    /// Ad-unit path; falls back to [`Config::path`].
    #[serde(default)]
    pub path: Option<String>,
    /// Accepted creative sizes.
    #[serde(default)]
    pub sizes: Vec<AdSize>,
    /// Name of an entry in [`Config::size_mappings`].
    #[serde(default)]
    pub size_mapping_name: Option<String>,
    /// Slot-level targeting.
    #[serde(default)]
    pub targeting: BTreeMap<String, TargetingValue>,
    /// Collapse behavior for empty slots.
    #[serde(default)]
    pub collapse_empty_div: Option<CollapseEmptyDiv>,
    /// Orchestrator bid configuration; one ad unit per entry.
    #[serde(default, alias = "prebid")]
    pub orchestrator: Vec<OrchestratorBidConfig>,
    /// Whether the slot takes part in the exchange auction.
    #[serde(default, alias = "amazon")]
    pub exchange: bool,
}

/// An out-of-page slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct OutOfPageSlotConfig {
    /// Unique slot id.
    pub id: String,
    /// Ad-unit path; falls back to [`Config::path`].
    #[serde(default)]
    pub path: Option<String>,
}

/// A creative size: `[w, h]` or a named size such as `"fluid"`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AdSize {
    /// Fixed width and height in pixels.
    Fixed(u32, u32),
    /// Named size understood by the ad server.
    Named(String),
}

/// A targeting value: one string or a list of strings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TargetingValue {
    /// Single value.
    Single(String),
    /// Multiple values.
    List(Vec<String>),
}

/// Collapse settings for a slot that receives no creative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollapseEmptyDiv {
    /// Collapse the container when empty.
    pub collapse: bool,
    /// Collapse before the ad is fetched.
    #[serde(default)]
    pub collapse_before_fetch: bool,
}

/// One orchestrator bid entry of a slot.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorBidConfig {
    /// Media types accepted by the ad unit.
    #[serde(default)]
    pub media_types: Value,
    /// Bidder entries, passed through untouched.
    #[serde(default)]
    pub bids: Vec<Value>,
}

/// One row of a size mapping: a minimum viewport and the sizes allowed from it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SizeMappingEntry {
    /// Minimum viewport `(width, height)`.
    #[serde(rename = "viewPortSize", alias = "viewport")]
    pub viewport: (u32, u32),
    /// Sizes allowed at this viewport; empty disables the slot.
    #[serde(default)]
    pub sizes: Vec<AdSize>,
}

/// Message matcher for one custom event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomEventConfig {
    /// Prefix a message must start with.
    #[serde(alias = "eventMessagePrefix")]
    pub message_prefix: String,
    /// Prefix prepended to the message suffix to form the slot id.
    #[serde(default, alias = "divIdPrefix")]
    pub slot_id_prefix: String,
}

/// Ad-server request settings.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdServerConfig {
    /// Request mode; `"SRA"` enables single-request mode.
    pub request_mode: Option<RequestMode>,
    /// Lazy-load settings; lazy loading stays off when absent.
    pub lazy_loading: Option<LazyLoadConfig>,
}

/// Ad-server request mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum RequestMode {
    /// One request for all slots.
    #[serde(rename = "SRA")]
    SingleRequest,
    /// Any other mode: one request per slot.
    #[serde(other)]
    Standard,
}

/// Lazy-load settings forwarded to the ad server.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LazyLoadConfig {
    /// Fetch margin, in viewport percent.
    #[serde(default)]
    pub fetch_margin_percent: Option<i32>,
    /// Render margin, in viewport percent.
    #[serde(default)]
    pub render_margin_percent: Option<i32>,
    /// Margin multiplier on mobile.
    #[serde(default)]
    pub mobile_scaling: Option<f64>,
}

/// Exchange client settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeConfig {
    /// Publisher id.
    #[serde(rename = "pubID", alias = "pubId")]
    pub pub_id: String,
    /// Ad-server identifier understood by the exchange.
    pub ad_server: String,
}
