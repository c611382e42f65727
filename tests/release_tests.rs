mod common;

use analytics_defer::{
    CallPayload, ChannelPage, DeferConfig, DeferPlugin, EnablePayload, Headless, HostHandle, InteractionKind,
};
use common::MockHost;
use serde_json::Map;
use std::time::Duration;

fn plugin(names: &[&str]) -> DeferPlugin {
    DeferPlugin::new(DeferConfig::new(names.iter().copied()).unwrap())
}

/// Lets spawned tasks observe what was just sent to them.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn test_at_most_once_enable() {
    let host = MockHost::new();
    let handle: HostHandle = host.clone();
    let mut defer = plugin(&["ga", "hotjar"]);
    let (page, emitter) = ChannelPage::new();

    assert!(defer.on_initialize_complete(&handle, &page));
    assert_eq!(emitter.listener_count(), 4);

    emitter.fire(InteractionKind::MouseMove);
    emitter.fire(InteractionKind::Scroll);
    emitter.fire(InteractionKind::MouseMove);
    settle().await;
    emitter.fire(InteractionKind::KeyDown);
    emitter.fire(InteractionKind::TouchStart);
    settle().await;

    assert_eq!(host.enable_requests(), vec![vec!["ga".to_string(), "hotjar".to_string()]]);
    assert!(defer.interaction_released());
    assert_eq!(defer.telemetry().bulk_enables, 1);
}

#[tokio::test(start_paused = true)]
async fn test_listeners_torn_down_after_first_interaction() {
    let host = MockHost::new();
    let handle: HostHandle = host.clone();
    let mut defer = plugin(&["ga"]);
    let (page, emitter) = ChannelPage::new();

    defer.on_initialize_complete(&handle, &page);
    assert!(defer.is_listening());
    emitter.fire(InteractionKind::TouchStart);
    settle().await;

    assert!(!defer.is_listening());
    assert_eq!(emitter.listener_count(), 0, "Every interaction kind is unsubscribed");
    assert_eq!(emitter.fire(InteractionKind::Scroll), 0);
}

#[tokio::test(start_paused = true)]
async fn test_initialize_twice_keeps_one_listener_set() {
    let host = MockHost::new();
    let handle: HostHandle = host.clone();
    let mut defer = plugin(&["ga"]);
    let (page, emitter) = ChannelPage::new();

    defer.on_initialize_complete(&handle, &page);
    defer.on_initialize_complete(&handle, &page);
    assert_eq!(emitter.listener_count(), 4);

    emitter.fire(InteractionKind::Scroll);
    settle().await;
    assert_eq!(host.enable_requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_headless_context_skips_interaction_release() {
    let host = MockHost::new();
    let handle: HostHandle = host.clone();
    let mut defer = plugin(&["ga"]);

    assert!(!defer.on_initialize_complete(&handle, &Headless));

    defer.on_track_start(&CallPayload::track("ssr", Map::new()), host.as_ref());
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(host.enable_requests().is_empty());
    assert!(host.dispatched().is_empty());

    // Explicit enablement is still a release path
    let jobs = defer.on_plugins_enabled(&EnablePayload::new(["ga"]), &handle);
    let mut delivered = 0;
    for job in jobs {
        delivered += job.join().await;
    }
    assert_eq!(delivered, 1);
}

#[test]
fn test_initialize_outside_runtime_registers_nothing() {
    let host = MockHost::new();
    let handle: HostHandle = host.clone();
    let mut defer = plugin(&["ga"]);
    let (page, emitter) = ChannelPage::new();

    assert!(!defer.on_initialize_complete(&handle, &page));
    assert!(!defer.is_listening());
    assert_eq!(emitter.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_listening() {
    let host = MockHost::new();
    let handle: HostHandle = host.clone();
    let mut defer = plugin(&["ga"]);
    let (page, emitter) = ChannelPage::new();

    defer.on_initialize_complete(&handle, &page);
    defer.shutdown();
    settle().await;

    assert_eq!(emitter.listener_count(), 0);
    emitter.fire(InteractionKind::Scroll);
    settle().await;
    assert!(host.enable_requests().is_empty());
    assert!(!defer.interaction_released());
}

#[tokio::test(start_paused = true)]
async fn test_interaction_then_enablement_replays_everything() {
    let host = MockHost::new();
    let handle: HostHandle = host.clone();
    let mut defer = plugin(&["ga", "hotjar"]);
    let (page, emitter) = ChannelPage::new();

    defer.on_initialize_complete(&handle, &page);
    defer.on_page_start(&CallPayload::page(Map::new()), host.as_ref());
    defer.on_track_start(&CallPayload::track("viewed", Map::new()), host.as_ref());
    assert!(host.dispatched().is_empty());

    emitter.fire(InteractionKind::Scroll);
    settle().await;

    // The host reports back what it was asked to enable
    let requested = host.enable_requests().remove(0);
    let jobs = defer.on_plugins_enabled(&EnablePayload::new(requested), &handle);
    assert_eq!(jobs.len(), 2);
    for job in jobs {
        assert_eq!(job.join().await, 2);
    }

    assert_eq!(defer.pending(), 0);
    assert_eq!(host.dispatched_to("ga").len(), 2);
    assert_eq!(host.dispatched_to("hotjar").len(), 2);

    // Calls after enablement are left to the host's normal dispatch
    let outcome = defer.on_track_start(&CallPayload::track("later", Map::new()), host.as_ref());
    assert!(outcome.deferred.is_empty());
    assert_eq!(defer.pending(), 0);
}
