//! Deferral kernel: the queue, the interception routine and the two release paths.
//!
//! Everything here is driven by the [`crate::plugin::DeferPlugin`] hooks. The queue
//! is only ever touched synchronously through `&mut` access; the release and replay
//! paths run on tokio tasks but never see the queue itself.

pub mod event;
pub mod intercept;
pub mod latch;
pub mod queue;
pub mod release;
pub mod replay;
pub mod telemetry;
pub mod time;
