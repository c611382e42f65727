use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::event::OperationKind;
use super::queue::DeferredRecord;
use super::telemetry::event::DeferTelemetryEvent;
use super::telemetry::recorder::TelemetryHandle;
use super::time::{ready_timeout, replay_delay};
use crate::host::{AnalyticsHost, DispatchError, HostHandle};

const READY_CHANNEL_CAPACITY: usize = 64;

/// Host-side "plugin is ready" announcements, by plugin name.
///
/// When the host provides one, replay waits for the matching announcement
/// instead of the fixed delay.
#[derive(Debug, Clone)]
pub struct ReadySignal {
    sender: broadcast::Sender<String>,
}

impl ReadySignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(READY_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Called by the host once `plugin` can receive calls.
    pub fn announce(&self, plugin: impl Into<String>) {
        // No receivers just means nothing is waiting on this plugin
        let _ = self.sender.send(plugin.into());
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::new()
    }
}

/// How a drained batch waits before dispatch.
#[derive(Debug)]
enum Readiness {
    Fixed(Duration),
    Signal {
        receiver: broadcast::Receiver<String>,
        timeout: Duration,
    },
}

impl Readiness {
    async fn wait(self, plugin: &str, telemetry: &TelemetryHandle) {
        match self {
            Readiness::Fixed(delay) => tokio::time::sleep(delay).await,
            Readiness::Signal { mut receiver, timeout } => {
                let announced = async {
                    loop {
                        match receiver.recv().await {
                            Ok(name) if name == plugin => return true,
                            Ok(_) => continue,
                            // Our announcement may have been among the dropped messages
                            Err(RecvError::Lagged(_)) => return true,
                            Err(RecvError::Closed) => return false,
                        }
                    }
                };

                match tokio::time::timeout(timeout, announced).await {
                    Ok(true) => {}
                    Ok(false) => {
                        debug!(plugin, "Ready signal closed, falling back to fixed delay");
                        tokio::time::sleep(replay_delay()).await;
                    }
                    Err(_) => {
                        warn!(plugin, timeout_ms = timeout.as_millis() as u64, "Plugin never reported ready, replaying anyway");
                        telemetry.record(DeferTelemetryEvent::ReadyTimeout {
                            plugin: plugin.to_string(),
                        });
                    }
                }
            }
        }
    }
}

/// A scheduled replay for one plugin. Dropping it does not cancel delivery.
#[derive(Debug)]
pub struct ReplayJob {
    pub plugin: String,
    pub count: usize,
    handle: JoinHandle<usize>,
}

impl ReplayJob {
    /// Waits for the batch and returns how many records were delivered.
    pub async fn join(self) -> usize {
        self.handle.await.unwrap_or(0)
    }
}

/// Replays drained records against the host once their plugin is ready.
pub struct Replayer {
    ready: Option<ReadySignal>,
    telemetry: TelemetryHandle,
}

impl Replayer {
    pub fn new(ready: Option<ReadySignal>, telemetry: TelemetryHandle) -> Self {
        Self { ready, telemetry }
    }

    /// Spawns one task for the batch so records are dispatched in queue order.
    ///
    /// The readiness receiver is subscribed here, synchronously, so an
    /// announcement sent right after the enablement notification is not missed.
    pub fn schedule(&self, plugin: String, records: Vec<DeferredRecord>, host: HostHandle) -> ReplayJob {
        let readiness = match &self.ready {
            Some(signal) => Readiness::Signal {
                receiver: signal.subscribe(),
                timeout: ready_timeout(),
            },
            None => Readiness::Fixed(replay_delay()),
        };
        let telemetry = self.telemetry.clone();
        let count = records.len();
        let task_plugin = plugin.clone();

        let handle = tokio::spawn(async move {
            readiness.wait(&task_plugin, &telemetry).await;

            let mut delivered = 0;
            for record in records {
                match dispatch(host.as_ref(), &record) {
                    Ok(()) => {
                        delivered += 1;
                        debug!(kind = %record.kind, plugin = %record.plugin, record_id = %record.id.0, "Replayed deferred call");
                        telemetry.record(DeferTelemetryEvent::Delivered {
                            kind: record.kind,
                            plugin: record.plugin,
                        });
                    }
                    // No retry: the record is already off the queue
                    Err(e) => {
                        warn!(record_id = %record.id.0, "Replay failed: {}", e);
                        telemetry.record(DeferTelemetryEvent::DeliveryFailed {
                            kind: record.kind,
                            plugin: record.plugin,
                        });
                    }
                }
            }
            info!(plugin = %task_plugin, delivered, total = count, "Replay batch finished");
            delivered
        });

        ReplayJob { plugin, count, handle }
    }
}

/// Re-issues a record with the call shape of its kind.
pub fn dispatch(host: &dyn AnalyticsHost, record: &DeferredRecord) -> Result<(), DispatchError> {
    let payload = &record.payload;
    match record.kind {
        OperationKind::Page => host.dispatch_page(&payload.properties, &payload.options),
        OperationKind::Track => host.dispatch_track(payload.event.as_deref(), &payload.properties, &payload.options),
        OperationKind::Identify => {
            host.dispatch_identify(payload.user_id.as_deref(), &payload.properties, &payload.options)
        }
    }
}
