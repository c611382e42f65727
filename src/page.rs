//! Page/document environment seen by the interaction release path.
//!
//! A [`PageEnvironment`] either hands out an [`InteractionSubscription`] (there
//! is a document to listen on) or returns `None` (server-side or headless
//! execution). Dropping the subscription removes every listener it registered.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

use crate::kernel::event::InteractionKind;

pub trait PageEnvironment {
    fn listen(&self, kinds: &[InteractionKind]) -> Option<InteractionSubscription>;
}

/// No document: interaction release is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl PageEnvironment for Headless {
    fn listen(&self, _kinds: &[InteractionKind]) -> Option<InteractionSubscription> {
        None
    }
}

type Teardown = Box<dyn FnOnce() + Send>;

/// Live listener registration. Events arrive through [`Self::next`].
pub struct InteractionSubscription {
    receiver: mpsc::UnboundedReceiver<InteractionKind>,
    teardown: Option<Teardown>,
}

impl InteractionSubscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<InteractionKind>, teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            receiver,
            teardown: Some(Box::new(teardown)),
        }
    }

    /// Next interaction, or `None` once the page stops delivering.
    pub async fn next(&mut self) -> Option<InteractionKind> {
        self.receiver.recv().await
    }
}

impl Drop for InteractionSubscription {
    fn drop(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl std::fmt::Debug for InteractionSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionSubscription")
            .field("active", &self.teardown.is_some())
            .finish()
    }
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    by_id: HashMap<u64, (Vec<InteractionKind>, mpsc::UnboundedSender<InteractionKind>)>,
}

/// Channel-backed document. Embedders forward real DOM events through the
/// paired [`InteractionEmitter`].
#[derive(Clone, Default)]
pub struct ChannelPage {
    listeners: Arc<Mutex<Listeners>>,
}

impl ChannelPage {
    pub fn new() -> (Self, InteractionEmitter) {
        let page = Self::default();
        let emitter = InteractionEmitter {
            listeners: page.listeners.clone(),
        };
        (page, emitter)
    }
}

impl PageEnvironment for ChannelPage {
    fn listen(&self, kinds: &[InteractionKind]) -> Option<InteractionSubscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.by_id.insert(id, (kinds.to_vec(), tx));
            id
        };

        let listeners = self.listeners.clone();
        Some(InteractionSubscription::new(rx, move || {
            listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .by_id
                .remove(&id);
        }))
    }
}

#[derive(Clone)]
pub struct InteractionEmitter {
    listeners: Arc<Mutex<Listeners>>,
}

impl InteractionEmitter {
    /// Delivers `kind` to every subscription listening for it. Returns how many
    /// were notified.
    pub fn fire(&self, kind: InteractionKind) -> usize {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners
            .by_id
            .values()
            .filter(|(kinds, _)| kinds.contains(&kind))
            .filter(|(_, tx)| tx.send(kind).is_ok())
            .count()
    }

    /// Registered (subscription, kind) pairs, like counting DOM listeners.
    pub fn listener_count(&self) -> usize {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.by_id.values().map(|(kinds, _)| kinds.len()).sum()
    }
}
