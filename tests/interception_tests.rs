mod common;

use analytics_defer::kernel::intercept::SkipReason;
use analytics_defer::{CallOptions, CallPayload, DeferConfig, DeferPlugin, OperationKind};
use common::{props, MockHost};
use serde_json::{json, Map};

fn plugin(names: &[&str]) -> DeferPlugin {
    DeferPlugin::new(DeferConfig::new(names.iter().copied()).unwrap())
}

#[test]
fn test_defers_one_record_per_plugin() {
    let host = MockHost::new();
    let mut defer = plugin(&["ga", "hotjar"]);

    let outcome = defer.on_track_start(&CallPayload::track("signup", Map::new()), host.as_ref());

    assert_eq!(outcome.deferred, vec!["ga", "hotjar"]);
    assert_eq!(defer.pending(), 2);
    assert_eq!(defer.pending_for("ga"), 1);
    assert_eq!(defer.pending_for("hotjar"), 1);
    assert!(host.dispatched().is_empty(), "Interception must never dispatch");
}

#[test]
fn test_abort_short_circuit() {
    let host = MockHost::new();
    let mut defer = plugin(&["ga", "hotjar"]);

    let payload = CallPayload::track("probe", Map::new()).with_abort("bot traffic");
    let outcome = defer.on_track_start(&payload, host.as_ref());

    assert!(outcome.aborted);
    assert!(outcome.deferred.is_empty());
    assert!(outcome.skipped.is_empty());
    assert_eq!(defer.pending(), 0);
    assert_eq!(defer.telemetry().aborted, 1);
}

#[test]
fn test_already_enabled_skip() {
    let host = MockHost::with_enabled(&["ga"]);
    let mut defer = plugin(&["ga", "hotjar"]);

    let outcome = defer.on_page_start(&CallPayload::page(Map::new()), host.as_ref());

    assert_eq!(outcome.skipped, vec![("ga".to_string(), SkipReason::AlreadyEnabled)]);
    assert_eq!(defer.pending_for("ga"), 0);
    assert_eq!(defer.pending_for("hotjar"), 1);
}

#[test]
fn test_targeting_exclusion() {
    let host = MockHost::new();
    let mut defer = plugin(&["ga", "hotjar", "fb"]);

    let payload = CallPayload::identify("u-1", Map::new()).with_options(CallOptions::targeting(["hotjar"]));
    let outcome = defer.on_identify_start(&payload, host.as_ref());

    assert_eq!(outcome.deferred, vec!["hotjar"]);
    assert_eq!(defer.pending(), 1);
    assert_eq!(defer.telemetry().skipped_untargeted, 2);
}

#[test]
fn test_all_true_does_not_restrict() {
    let host = MockHost::new();
    let mut defer = plugin(&["ga", "hotjar"]);

    let options: CallOptions = serde_json::from_value(json!({ "all": true, "ga": false })).unwrap();
    defer.on_track_start(&CallPayload::track("x", Map::new()).with_options(options), host.as_ref());

    assert_eq!(defer.pending(), 2);
}

#[test]
fn test_record_is_narrowed_to_its_plugin() {
    let host = MockHost::new();
    let mut defer = plugin(&["ga", "hotjar"]);

    let payload: CallPayload = serde_json::from_value(json!({
        "event": "checkout",
        "properties": { "total": 42 },
        "options": { "all": false, "ga": true, "hotjar": { "heatmap": true }, "context": "web" },
        "meta": { "rid": "r-9" }
    }))
    .unwrap();
    defer.on_track_start(&payload, host.as_ref());

    let records: Vec<_> = defer.queue().iter().collect();
    assert_eq!(records.len(), 2);

    let ga = records.iter().find(|r| r.plugin == "ga").unwrap();
    assert_eq!(ga.kind, OperationKind::Track);
    assert_eq!(ga.payload.event.as_deref(), Some("checkout"));
    assert_eq!(ga.payload.properties, props(json!({ "total": 42 })));
    assert_eq!(ga.payload.extra.get("meta"), Some(&json!({ "rid": "r-9" })));
    assert_eq!(ga.payload.options.all, Some(false));
    assert_eq!(ga.payload.options.targets.get("context"), Some(&json!("web")));
    assert_eq!(ga.payload.options.targets.get("hotjar"), Some(&json!(false)));

    let hotjar = records.iter().find(|r| r.plugin == "hotjar").unwrap();
    assert_eq!(hotjar.payload.options.targets.get("hotjar"), Some(&json!(true)));
    assert!(!hotjar.payload.options.is_targeted("ga"));
    assert_ne!(ga.id, hotjar.id);
}

#[test]
fn test_on_ready_reports_immediately() {
    let defer = plugin(&["ga"]);
    assert!(defer.on_ready());
    assert_eq!(defer.name(), "defer-plugin");
    assert_eq!(defer.plugins(), ["ga".to_string()]);
}
