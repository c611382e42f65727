//! Deferral telemetry
//!
//! # READ-ONLY INVARIANT
//! Telemetry is a side-effect layer. Nothing in interception or replay reads it
//! back to make a decision.
//!
//! # PRIVACY INVARIANT
//! Events carry operation kinds, plugin names and counts only. Never properties,
//! event names or user ids.

pub mod event;
pub mod metrics;
pub mod recorder;
