//! Command dispatcher integration tests.
//!
//! Covers each response shape of the control endpoint:
//! - accepted command
//! - `error` field reported verbatim
//! - plain HTTP failure
//! - unreachable endpoint

mod integration;
use integration::common::mock_control::MockControlServer;

use mower_command::{CommandArgs, CommandDispatcher, CommandOutcome, CommandRequest, DispatcherConfig};
use serde_json::json;

fn dispatcher_for(base_url: String) -> CommandDispatcher {
    CommandDispatcher::new(DispatcherConfig {
        base_url,
        timeout_ms: 2000,
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_emergency_accepted() {
    let server = MockControlServer::start().await;
    let dispatcher = dispatcher_for(server.url());

    let request = CommandRequest::new("emergency").with_arg("emergency", 1);
    let outcome = dispatcher.send(&request).await;

    assert_eq!(outcome, CommandOutcome::Success);
    assert_eq!(
        server.received(),
        vec![("emergency".to_string(), json!({"emergency": 1}))]
    );

    server.shutdown();
}

#[tokio::test]
async fn test_error_field_reported_verbatim() {
    let server = MockControlServer::start().await;
    server.respond("emergency", 500, r#"{"error":"device offline"}"#);
    let dispatcher = dispatcher_for(server.url());

    let mut args = CommandArgs::new();
    args.insert("emergency".to_string(), 1.into());
    let outcome = dispatcher.dispatch("emergency", args).await;

    assert_eq!(outcome.message(), Some("device offline"));
    server.shutdown();
}

#[tokio::test]
async fn test_plain_http_failure() {
    let server = MockControlServer::start().await;
    server.respond("mower_start", 503, "");
    let dispatcher = dispatcher_for(server.url());

    let outcome = dispatcher.dispatch("mower_start", CommandArgs::new()).await;
    assert_eq!(outcome, CommandOutcome::failure("HTTP 503"));

    // exactly one call, no retry
    assert_eq!(server.received().len(), 1);
    assert_eq!(server.received()[0].1, json!({}));

    server.shutdown();
}

#[tokio::test]
async fn test_unknown_route_is_failure() {
    let server = MockControlServer::start().await;
    let dispatcher = CommandDispatcher::new(DispatcherConfig {
        base_url: server.url(),
        call_path: "/api/other/call".to_string(),
        timeout_ms: 2000,
    })
    .unwrap();

    let outcome = dispatcher.dispatch("mower_home", CommandArgs::new()).await;
    assert!(outcome.message().unwrap().starts_with("HTTP 404"));
    assert!(server.received().is_empty());

    server.shutdown();
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let dispatcher = dispatcher_for("http://127.0.0.1:1".to_string());

    let outcome = dispatcher.dispatch("mower_home", CommandArgs::new()).await;
    assert!(!outcome.is_success());
    assert!(outcome.message().unwrap().contains("HTTP request failed"));
}

#[tokio::test]
async fn test_invalid_action_never_sent() {
    let server = MockControlServer::start().await;
    let dispatcher = dispatcher_for(server.url());

    let outcome = dispatcher.dispatch("../reboot", CommandArgs::new()).await;
    assert!(!outcome.is_success());
    assert!(server.received().is_empty());

    server.shutdown();
}
