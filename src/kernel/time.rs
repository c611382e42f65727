use std::time::Duration;

/// Wait before replaying a drained batch when the host offers no readiness signal.
/// The host enables plugins asynchronously, so the plugin is not ready at the moment
/// the enablement notification arrives.
pub const REPLAY_DELAY_MS: u64 = 100;

/// Upper bound on waiting for a host readiness announcement before replaying anyway.
pub const READY_TIMEOUT_MS: u64 = 5_000;

pub fn replay_delay() -> Duration {
    Duration::from_millis(REPLAY_DELAY_MS)
}

pub fn ready_timeout() -> Duration {
    Duration::from_millis(READY_TIMEOUT_MS)
}
