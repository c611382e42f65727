use serde::{Deserialize, Serialize};
use tracing::debug;

use super::event::{CallPayload, OperationKind};
use super::queue::{DeferralQueue, DeferredRecord};
use super::telemetry::event::DeferTelemetryEvent;
use super::telemetry::recorder::TelemetryHandle;
use crate::host::AnalyticsHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Host already reports the plugin enabled; its normal dispatch handles the call.
    AlreadyEnabled,
    /// The call was restricted to other plugins.
    NotTargeted,
}

/// What one interception did, per configured plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterceptOutcome {
    pub aborted: bool,
    pub deferred: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
}

/// Queues one narrowed copy of `payload` per configured plugin that is neither
/// enabled nor excluded by the call's targeting. Never dispatches.
pub fn intercept(
    kind: OperationKind,
    payload: &CallPayload,
    plugins: &[String],
    host: &dyn AnalyticsHost,
    queue: &mut DeferralQueue,
    telemetry: &TelemetryHandle,
) -> InterceptOutcome {
    let mut outcome = InterceptOutcome::default();

    // Cancelled upstream: nothing to defer for anyone
    if payload.is_aborted() {
        debug!(%kind, "Ignoring aborted payload");
        telemetry.record(DeferTelemetryEvent::Aborted { kind });
        outcome.aborted = true;
        return outcome;
    }

    for plugin in plugins {
        let skip = if host.is_enabled(plugin) {
            Some(SkipReason::AlreadyEnabled)
        } else if payload.options.restricts(plugin) {
            Some(SkipReason::NotTargeted)
        } else {
            None
        };

        if let Some(reason) = skip {
            debug!(%kind, plugin = %plugin, ?reason, "Not deferring");
            telemetry.record(DeferTelemetryEvent::Skipped {
                kind,
                plugin: plugin.clone(),
                reason,
            });
            outcome.skipped.push((plugin.clone(), reason));
            continue;
        }

        let record = DeferredRecord::new(kind, plugin, payload, plugins);
        debug!(%kind, plugin = %plugin, record_id = %record.id.0, "Deferred call");
        telemetry.record(DeferTelemetryEvent::Deferred {
            kind,
            plugin: plugin.clone(),
        });
        queue.enqueue(record);
        outcome.deferred.push(plugin.clone());
    }

    outcome
}
