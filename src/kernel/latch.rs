use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-shot guard for the bulk enable request. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct EnablementLatch {
    fired: Arc<AtomicBool>,
}

impl EnablementLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true only for the single caller that flips the latch.
    pub fn try_fire(&self) -> bool {
        self.fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}
