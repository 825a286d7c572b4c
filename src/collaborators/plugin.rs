//! # Lifecycle plugins.
//!
//! A [`Plugin`] observes the configuration at fixed points of setup and
//! teardown, typically to push extra commands to a collaborator. Hooks run
//! in registration order. `setup` runs on the caller's task; all other hooks
//! run inside the command queue they are named after, so a panicking hook is
//! isolated by the bridge like any other queued operation.
//!
//! ```text
//! setup()     ── setup
//!             ├─ orchestrator queue: setup_orchestrator
//!             └─ ad-server queue:    setup_ad_server, display_slots, display_out_of_page_slots
//! teardown()  ├─ orchestrator queue: teardown_orchestrator
//!             └─ ad-server queue:    teardown_ad_server
//! ```

use crate::config::Config;

/// Optional lifecycle hooks; every method defaults to a no-op.
pub trait Plugin: Send + Sync + 'static {
    fn setup(&self, _config: &Config) {}

    fn setup_orchestrator(&self, _config: &Config) {}

    fn setup_ad_server(&self, _config: &Config) {}

    fn teardown_orchestrator(&self, _config: &Config) {}

    fn teardown_ad_server(&self, _config: &Config) {}

    /// Runs right before standard slots are displayed.
    fn display_slots(&self, _config: &Config) {}

    /// Runs right before out-of-page slots are displayed.
    fn display_out_of_page_slots(&self, _config: &Config) {}
}
