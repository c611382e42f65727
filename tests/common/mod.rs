#![allow(dead_code)]

use analytics_defer::{AnalyticsHost, CallOptions, DispatchError, OperationKind, PluginState};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    pub kind: OperationKind,
    /// Event name for track, user id for identify.
    pub name: Option<String>,
    pub properties: Map<String, Value>,
    pub options: CallOptions,
}

impl Dispatched {
    pub fn is_targeted(&self, plugin: &str) -> bool {
        self.options.is_targeted(plugin)
    }
}

/// Records every host interaction. Enablement only flips state; tests deliver
/// the notification to the plugin themselves.
#[derive(Default)]
pub struct MockHost {
    enabled: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
    pub enable_requests: Mutex<Vec<Vec<String>>>,
    pub dispatched: Mutex<Vec<Dispatched>>,
}

impl MockHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_enabled(plugins: &[&str]) -> Arc<Self> {
        let host = Self::default();
        host.enabled
            .lock()
            .unwrap()
            .extend(plugins.iter().map(|p| p.to_string()));
        Arc::new(host)
    }

    pub fn fail_dispatch_on(&self, event: &str) {
        self.failing.lock().unwrap().insert(event.to_string());
    }

    pub fn dispatched(&self) -> Vec<Dispatched> {
        self.dispatched.lock().unwrap().clone()
    }

    pub fn dispatched_to(&self, plugin: &str) -> Vec<Dispatched> {
        self.dispatched().into_iter().filter(|d| d.is_targeted(plugin)).collect()
    }

    pub fn enable_requests(&self) -> Vec<Vec<String>> {
        self.enable_requests.lock().unwrap().clone()
    }

    fn push(
        &self,
        kind: OperationKind,
        name: Option<&str>,
        properties: &Map<String, Value>,
        options: &CallOptions,
    ) -> Result<(), DispatchError> {
        if let Some(name) = name {
            if self.failing.lock().unwrap().contains(name) {
                return Err(DispatchError::new("mock", format!("{} rejected", name)));
            }
        }
        self.dispatched.lock().unwrap().push(Dispatched {
            kind,
            name: name.map(str::to_string),
            properties: properties.clone(),
            options: options.clone(),
        });
        Ok(())
    }
}

impl AnalyticsHost for MockHost {
    fn plugin_state(&self, plugin: &str) -> Option<PluginState> {
        Some(PluginState {
            enabled: self.enabled.lock().unwrap().contains(plugin),
        })
    }

    fn enable_plugins(&self, plugins: &[String]) {
        self.enabled.lock().unwrap().extend(plugins.iter().cloned());
        self.enable_requests.lock().unwrap().push(plugins.to_vec());
    }

    fn dispatch_page(&self, properties: &Map<String, Value>, options: &CallOptions) -> Result<(), DispatchError> {
        self.push(OperationKind::Page, None, properties, options)
    }

    fn dispatch_track(
        &self,
        event: Option<&str>,
        properties: &Map<String, Value>,
        options: &CallOptions,
    ) -> Result<(), DispatchError> {
        self.push(OperationKind::Track, event, properties, options)
    }

    fn dispatch_identify(
        &self,
        user_id: Option<&str>,
        properties: &Map<String, Value>,
        options: &CallOptions,
    ) -> Result<(), DispatchError> {
        self.push(OperationKind::Identify, user_id, properties, options)
    }
}

pub fn props(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
