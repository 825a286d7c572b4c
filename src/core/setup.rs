//! # Bridged setup and teardown operations.
//!
//! Each function here runs inside a collaborator's command queue, pushed by
//! [`Engine::setup`](crate::Engine::setup) / [`Engine::teardown`](crate::Engine::teardown).
//!
//! ## Rules
//! - The registry and the size-mapping cache are built locally and swapped into
//!   [`EngineState`] in one step, so the registry is never seen half populated.
//! - A failure aborts the rest of that operation; the error reaches the
//!   bridge's error handler.
//! - Slots whose size mapping allows no size at the current viewport are not
//!   defined, displayed or registered.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::state::EngineState;
use crate::collaborators::{AdServer, Orchestrator, Plugin, SlotDefinition};
use crate::config::Config;
use crate::slots::{SizeMappingCache, SlotRegistry, ad_units, fits_viewport};

pub(crate) type Plugins = Arc<[Arc<dyn Plugin>]>;

pub(crate) fn setup_orchestrator(
    orchestrator: &dyn Orchestrator,
    config: &Config,
    plugins: &Plugins,
) -> anyhow::Result<()> {
    for plugin in plugins.iter() {
        plugin.setup_orchestrator(config);
    }
    orchestrator.add_ad_units(ad_units(config))?;
    orchestrator.set_config(&config.orchestrator)
}

pub(crate) fn teardown_orchestrator(
    orchestrator: &dyn Orchestrator,
    config: &Config,
    plugins: &Plugins,
) -> anyhow::Result<()> {
    for plugin in plugins.iter() {
        plugin.teardown_orchestrator(config);
    }
    let mut removed: Vec<String> = Vec::new();
    for unit in ad_units(config) {
        if removed.contains(&unit.code) {
            continue;
        }
        orchestrator.remove_ad_unit(&unit.code)?;
        removed.push(unit.code);
    }
    Ok(())
}

pub(crate) fn setup_ad_server(
    ad_server: &dyn AdServer,
    config: &Config,
    plugins: &Plugins,
    state: &Mutex<EngineState>,
) -> anyhow::Result<()> {
    for plugin in plugins.iter() {
        plugin.setup_ad_server(config);
    }

    let mut size_mappings = SizeMappingCache::new();
    for (name, entries) in &config.size_mappings {
        size_mappings.insert(name.as_str(), ad_server.build_size_mapping(entries)?);
    }

    let viewport = ad_server.viewport();
    let mut registry = SlotRegistry::new();
    let mut displayed: Vec<&str> = Vec::with_capacity(config.slots.len());
    for slot in &config.slots {
        let mapping = slot
            .size_mapping_name
            .as_deref()
            .and_then(|name| config.size_mappings.get(name));
        if mapping.is_some_and(|entries| !fits_viewport(entries, viewport)) {
            debug!(slot = %slot.id, ?viewport, "slot hidden at this viewport");
            continue;
        }

        let handle = ad_server.define_slot(&SlotDefinition {
            id: &slot.id,
            path: config.path_of(slot.path.as_deref()),
            sizes: &slot.sizes,
            size_mapping: slot
                .size_mapping_name
                .as_deref()
                .and_then(|name| size_mappings.get(name)),
            collapse_empty_div: slot.collapse_empty_div,
            targeting: &slot.targeting,
        })?;
        registry.insert_slot(slot.id.as_str(), handle);
        displayed.push(&slot.id);
    }
    for slot in &config.out_of_page_slots {
        let handle =
            ad_server.define_out_of_page_slot(config.path_of(slot.path.as_deref()), &slot.id)?;
        registry.insert_out_of_page(slot.id.as_str(), handle);
    }

    {
        let mut st = state.lock().unwrap_or_else(PoisonError::into_inner);
        st.size_mappings = size_mappings;
        st.registry = registry;
    }

    for (key, value) in &config.targeting {
        ad_server.set_page_targeting(key, value)?;
    }
    ad_server.disable_initial_load()?;
    if config.single_request() {
        ad_server.enable_single_request()?;
    }
    if let Some(lazy) = &config.ad_server.lazy_loading {
        ad_server.enable_lazy_load(lazy)?;
    }
    ad_server.enable_services()?;

    for plugin in plugins.iter() {
        plugin.display_slots(config);
    }
    for id in displayed {
        ad_server.display(id)?;
    }
    for plugin in plugins.iter() {
        plugin.display_out_of_page_slots(config);
    }
    for slot in &config.out_of_page_slots {
        ad_server.display(&slot.id)?;
    }
    Ok(())
}

pub(crate) fn teardown_ad_server(
    ad_server: &dyn AdServer,
    config: &Config,
    plugins: &Plugins,
) -> anyhow::Result<()> {
    for plugin in plugins.iter() {
        plugin.teardown_ad_server(config);
    }
    ad_server.destroy_slots()
}
