use serde::Serialize;
use std::collections::VecDeque;

use super::event::DeferTelemetryEvent;
use crate::kernel::intercept::SkipReason;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TelemetrySnapshot {
    pub deferred: u64,
    pub skipped_enabled: u64,
    pub skipped_untargeted: u64,
    pub aborted: u64,
    pub drained: u64,
    pub delivered: u64,
    pub failed: u64,
    pub bulk_enables: u64,
    pub ready_timeouts: u64,
}

impl TelemetrySnapshot {
    /// Records taken off the queue whose replay has not finished yet.
    pub fn in_flight(&self) -> u64 {
        self.drained.saturating_sub(self.delivered + self.failed)
    }
}

pub fn compute_snapshot(events: &VecDeque<DeferTelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            DeferTelemetryEvent::Deferred { .. } => snap.deferred += 1,
            DeferTelemetryEvent::Skipped { reason, .. } => match reason {
                SkipReason::AlreadyEnabled => snap.skipped_enabled += 1,
                SkipReason::NotTargeted => snap.skipped_untargeted += 1,
            },
            DeferTelemetryEvent::Aborted { .. } => snap.aborted += 1,
            DeferTelemetryEvent::Drained { count, .. } => snap.drained += *count as u64,
            DeferTelemetryEvent::Delivered { .. } => snap.delivered += 1,
            DeferTelemetryEvent::DeliveryFailed { .. } => snap.failed += 1,
            DeferTelemetryEvent::BulkEnableRequested { .. } => snap.bulk_enables += 1,
            DeferTelemetryEvent::ReadyTimeout { .. } => snap.ready_timeouts += 1,
        }
    }

    snap
}
