use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::latch::EnablementLatch;
use super::telemetry::event::DeferTelemetryEvent;
use super::telemetry::recorder::TelemetryHandle;
use crate::host::HostHandle;
use crate::page::InteractionSubscription;

/// Background listener that turns the first page interaction into one bulk
/// enable request.
///
/// Does not touch the deferral queue: the host's enablement notification
/// drives the replay.
pub struct InteractionRelease {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl InteractionRelease {
    pub fn spawn(
        mut subscription: InteractionSubscription,
        latch: EnablementLatch,
        host: HostHandle,
        plugins: Vec<String>,
        telemetry: TelemetryHandle,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Interaction release cancelled before any interaction");
                }
                first = subscription.next() => match first {
                    Some(kind) => {
                        if latch.try_fire() {
                            info!(trigger = kind.event_type(), plugins = ?plugins, "Visitor interacted, enabling deferred plugins");
                            host.enable_plugins(&plugins);
                            telemetry.record(DeferTelemetryEvent::BulkEnableRequested { plugins });
                        }
                    }
                    None => debug!("Page stopped delivering interactions"),
                },
            }
            // Removes the listener for every kind, not only the one that fired
            drop(subscription);
        });

        Self { cancel, handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for InteractionRelease {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
