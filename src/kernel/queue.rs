use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::event::{CallPayload, OperationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        RecordId(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

/// A call held back for one plugin. The payload's options target exactly `plugin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferredRecord {
    pub id: RecordId,
    pub kind: OperationKind,
    pub plugin: String,
    pub payload: CallPayload,
}

impl DeferredRecord {
    /// Narrows `payload` to `plugin` among the `managed` set and stamps a fresh id.
    pub fn new(kind: OperationKind, plugin: &str, payload: &CallPayload, managed: &[String]) -> Self {
        Self {
            id: RecordId::new(),
            kind,
            plugin: plugin.to_string(),
            payload: payload.retarget(plugin, managed),
        }
    }

    /// Matches on the owning plugin. Flags for plugins outside the managed set
    /// can still be truthy in the options and must not release this record.
    pub fn is_destined_for(&self, plugin: &str) -> bool {
        self.plugin == plugin
    }
}

/// Pending deferred calls in the order they were intercepted.
///
/// Lives for the page session only. Appended to by interception, shrunk by
/// [`DeferralQueue::drain_for`]; nothing else mutates it.
#[derive(Debug, Default)]
pub struct DeferralQueue {
    records: Vec<DeferredRecord>,
}

impl DeferralQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, record: DeferredRecord) {
        self.records.push(record);
    }

    /// Removes and returns every record destined for `plugin`, keeping the
    /// relative order of both the drained and the remaining records.
    pub fn drain_for(&mut self, plugin: &str) -> Vec<DeferredRecord> {
        let (destined, remaining): (Vec<_>, Vec<_>) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(|record| record.is_destined_for(plugin));
        self.records = remaining;
        destined
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn pending_for(&self, plugin: &str) -> usize {
        self.records.iter().filter(|r| r.is_destined_for(plugin)).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeferredRecord> {
        self.records.iter()
    }
}
