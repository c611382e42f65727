//! Contract with the host analytics runtime.
//!
//! The host owns plugin registration, enablement and the actual per-plugin
//! dispatch. The defer plugin only reads plugin state, requests enablement and
//! re-issues calls through this trait.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::kernel::event::CallOptions;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginState {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dispatch to {plugin} failed: {reason}")]
pub struct DispatchError {
    pub plugin: String,
    pub reason: String,
}

impl DispatchError {
    pub fn new(plugin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            reason: reason.into(),
        }
    }
}

pub trait AnalyticsHost: Send + Sync {
    /// Registry lookup. `None` means the host does not know the plugin, which
    /// is treated as not enabled.
    fn plugin_state(&self, plugin: &str) -> Option<PluginState>;

    /// Requests enablement. The host completes it asynchronously and then
    /// reports it back through `DeferPlugin::on_plugins_enabled`.
    fn enable_plugins(&self, plugins: &[String]);

    fn dispatch_page(&self, properties: &Map<String, Value>, options: &CallOptions) -> Result<(), DispatchError>;

    fn dispatch_track(
        &self,
        event: Option<&str>,
        properties: &Map<String, Value>,
        options: &CallOptions,
    ) -> Result<(), DispatchError>;

    fn dispatch_identify(
        &self,
        user_id: Option<&str>,
        properties: &Map<String, Value>,
        options: &CallOptions,
    ) -> Result<(), DispatchError>;

    fn is_enabled(&self, plugin: &str) -> bool {
        self.plugin_state(plugin).map_or(false, |state| state.enabled)
    }
}

pub type HostHandle = Arc<dyn AnalyticsHost>;
