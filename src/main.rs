use analytics_defer::kernel::event::InteractionKind;
use analytics_defer::{
    AnalyticsHost, CallOptions, CallPayload, ChannelPage, DeferConfig, DeferPlugin, DispatchError, EnablePayload,
    HostHandle, PluginState,
};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// In-memory host: enablement completes on a later turn and is reported back
/// to the driver loop as an `EnablePayload`.
struct DemoHost {
    enabled: Mutex<HashSet<String>>,
    notify: mpsc::UnboundedSender<EnablePayload>,
}

impl DemoHost {
    fn sent(&self, plugin: &str, line: String) {
        tracing::info!("[{}] {}", plugin, line);
    }

    fn target(options: &CallOptions) -> String {
        options
            .targets
            .iter()
            .find(|(_, v)| v.as_bool() == Some(true))
            .map(|(k, _)| k.clone())
            .unwrap_or_else(|| "all".to_string())
    }
}

impl AnalyticsHost for DemoHost {
    fn plugin_state(&self, plugin: &str) -> Option<PluginState> {
        let enabled = self.enabled.lock().unwrap_or_else(PoisonError::into_inner);
        Some(PluginState {
            enabled: enabled.contains(plugin),
        })
    }

    fn enable_plugins(&self, plugins: &[String]) {
        self.enabled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(plugins.iter().cloned());
        let _ = self.notify.send(EnablePayload::new(plugins.iter().cloned()));
    }

    fn dispatch_page(&self, properties: &Map<String, Value>, options: &CallOptions) -> Result<(), DispatchError> {
        self.sent(&Self::target(options), format!("page {}", Value::Object(properties.clone())));
        Ok(())
    }

    fn dispatch_track(
        &self,
        event: Option<&str>,
        properties: &Map<String, Value>,
        options: &CallOptions,
    ) -> Result<(), DispatchError> {
        self.sent(
            &Self::target(options),
            format!("track {} {}", event.unwrap_or("-"), Value::Object(properties.clone())),
        );
        Ok(())
    }

    fn dispatch_identify(
        &self,
        user_id: Option<&str>,
        properties: &Map<String, Value>,
        options: &CallOptions,
    ) -> Result<(), DispatchError> {
        self.sent(
            &Self::target(options),
            format!("identify {} {}", user_id.unwrap_or("-"), Value::Object(properties.clone())),
        );
        Ok(())
    }
}

fn props(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match std::env::args().nth(1) {
        Some(path) => DeferConfig::from_path(path)?,
        None => DeferConfig::new(["google-analytics", "hotjar"])?,
    };
    tracing::info!("Deferring plugins: {:?}", config.plugins);

    let (notify_tx, mut notify_rx) = mpsc::unbounded_channel();
    let demo = Arc::new(DemoHost {
        enabled: Mutex::new(HashSet::new()),
        notify: notify_tx,
    });
    let host: HostHandle = demo.clone();

    let mut plugin = DeferPlugin::new(config);
    let (page, emitter) = ChannelPage::new();
    plugin.on_initialize_complete(&host, &page);

    // Calls made on page load, before any engagement
    plugin.on_page_start(&CallPayload::page(props(json!({ "path": "/pricing" }))), demo.as_ref());
    plugin.on_track_start(
        &CallPayload::track("plan_viewed", props(json!({ "plan": "pro" }))),
        demo.as_ref(),
    );
    plugin.on_identify_start(
        &CallPayload::identify("user-42", Map::new()).with_options(CallOptions::targeting(["hotjar"])),
        demo.as_ref(),
    );
    plugin.on_track_start(&CallPayload::track("bot_probe", Map::new()).with_abort("filtered"), demo.as_ref());
    tracing::info!("{} call(s) deferred", plugin.pending());

    tokio::time::sleep(Duration::from_millis(250)).await;
    tracing::info!("Simulating scroll");
    emitter.fire(InteractionKind::Scroll);
    emitter.fire(InteractionKind::MouseMove);

    let mut jobs = Vec::new();
    if let Some(enabled) = notify_rx.recv().await {
        jobs.extend(plugin.on_plugins_enabled(&enabled, &host));
    }
    for job in jobs {
        let plugin_name = job.plugin.clone();
        let delivered = job.join().await;
        tracing::info!("Replayed {} call(s) to {}", delivered, plugin_name);
    }

    println!("{}", serde_json::to_string_pretty(&plugin.telemetry())?);
    plugin.shutdown();
    Ok(())
}
