use serde::{Deserialize, Serialize};

use crate::kernel::event::OperationKind;
use crate::kernel::intercept::SkipReason;

// Allowed: kinds, plugin names, counts
// Forbidden: properties, event names, user ids

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeferTelemetryEvent {
    Deferred {
        kind: OperationKind,
        plugin: String,
    },

    Skipped {
        kind: OperationKind,
        plugin: String,
        reason: SkipReason,
    },

    Aborted {
        kind: OperationKind,
    },

    /// Records removed from the queue for replay.
    Drained {
        plugin: String,
        count: usize,
    },

    Delivered {
        kind: OperationKind,
        plugin: String,
    },

    DeliveryFailed {
        kind: OperationKind,
        plugin: String,
    },

    BulkEnableRequested {
        plugins: Vec<String>,
    },

    /// Readiness announcement never came; replayed after the timeout.
    ReadyTimeout {
        plugin: String,
    },
}
