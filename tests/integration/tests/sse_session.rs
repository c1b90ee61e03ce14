//! End-to-end session protocol tests over a real HTTP listener.
//!
//! Each test boots the gateway on an ephemeral port, opens a real SSE
//! stream with reqwest, and drives the JSON-RPC handshake the way an
//! MCP client would.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wxbridge_automation::DryRunDriver;
use wxbridge_core::types::ChatMessage;
use wxbridge_integration_tests::{post_rpc, spawn_gateway, spawn_gateway_with, SseClient};

/// Open a stream and return its advertised message endpoint.
async fn open_session(base: &str) -> (SseClient, String) {
    let mut sse = SseClient::connect(base).await;
    let event = sse.next_event().await;
    assert_eq!(event.event.as_deref(), Some("endpoint"));
    let endpoint = event.data.clone();
    assert!(
        endpoint.starts_with("/messages?session_id="),
        "Endpoint should carry the session id, got: {}",
        endpoint
    );
    (sse, endpoint)
}

async fn initialize(base: &str, endpoint: &str, sse: &mut SseClient) -> Value {
    post_rpc(
        base,
        endpoint,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {"clientInfo": {"name": "cherry-studio", "version": "1.0"}}
        }),
    )
    .await;
    sse.next_json().await
}

#[tokio::test]
async fn test_full_session_handshake() {
    let (base, _state) = spawn_gateway().await;
    let (mut sse, endpoint) = open_session(&base).await;

    // initialize returns the server descriptor.
    let response = initialize(&base, &endpoint, &mut sse).await;
    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(response["result"]["serverInfo"]["name"], "wxbridge");
    assert!(response["result"]["capabilities"]["tools"].is_object());

    // tools/list returns the full catalog.
    post_rpc(
        &base,
        &endpoint,
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
    )
    .await;
    let response = sse.next_json().await;
    let tools = response["result"]["tools"].as_array().expect("tools array");
    assert_eq!(tools.len(), 3);
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    assert!(names.contains(&"send_message"), "Got tools: {:?}", names);
    assert!(names.contains(&"get_all_messages"), "Got tools: {:?}", names);
    assert!(names.contains(&"get_contact_list"), "Got tools: {:?}", names);

    // Unknown tool is an invalid-params error.
    post_rpc(
        &base,
        &endpoint,
        json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {"name": "no_such_tool", "arguments": {}}
        }),
    )
    .await;
    let response = sse.next_json().await;
    assert_eq!(response["id"], 3);
    assert_eq!(response["error"]["code"], -32602);

    // Unknown method is a method-not-found error.
    post_rpc(
        &base,
        &endpoint,
        json!({"jsonrpc": "2.0", "id": 4, "method": "bogus/method"}),
    )
    .await;
    let response = sse.next_json().await;
    assert_eq!(response["error"]["code"], -32601);
}

#[tokio::test]
async fn test_requests_gated_until_initialize() {
    let (base, _state) = spawn_gateway().await;
    let (mut sse, endpoint) = open_session(&base).await;

    post_rpc(
        &base,
        &endpoint,
        json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
    )
    .await;
    let response = sse.next_json().await;
    assert_eq!(response["error"]["code"], -32002);
    let message = response["error"]["message"].as_str().unwrap_or_default();
    assert!(
        message.contains("initialized"),
        "Error should mention initialization: {}",
        message
    );
}

#[tokio::test]
async fn test_send_message_through_driver() {
    let driver = Arc::new(DryRunDriver::new());
    let (base, _state) = spawn_gateway_with(driver.clone()).await;
    let (mut sse, endpoint) = open_session(&base).await;
    initialize(&base, &endpoint, &mut sse).await;

    post_rpc(
        &base,
        &endpoint,
        json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": {
                "name": "send_message",
                "arguments": {"msg": "hello from the bridge", "to": "Alice"}
            }
        }),
    )
    .await;
    let response = sse.next_json().await;
    let text = response["result"]["content"][0]["text"]
        .as_str()
        .expect("text content");
    assert!(
        text.contains("Message sent successfully"),
        "Got tool output: {}",
        text
    );

    let sent = driver.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "Alice");
    assert_eq!(sent[0].text, "hello from the bridge");
}

#[tokio::test]
async fn test_chat_history_round_trip() {
    let driver = Arc::new(DryRunDriver::new());
    driver.seed_history(
        "Alice",
        vec![
            ChatMessage::new("Alice", "hi"),
            ChatMessage::new("me", "hello"),
        ],
    );
    let (base, _state) = spawn_gateway_with(driver).await;
    let (mut sse, endpoint) = open_session(&base).await;
    initialize(&base, &endpoint, &mut sse).await;

    post_rpc(
        &base,
        &endpoint,
        json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": {"name": "get_all_messages", "arguments": {"who": "Alice"}}
        }),
    )
    .await;
    let response = sse.next_json().await;
    let text = response["result"]["content"][0]["text"]
        .as_str()
        .expect("text content");
    assert!(text.contains("Alice: hi"), "Got tool output: {}", text);
    assert!(text.contains("me: hello"), "Got tool output: {}", text);
}

#[tokio::test]
async fn test_notifications_produce_no_response() {
    let (base, _state) = spawn_gateway().await;
    let (mut sse, endpoint) = open_session(&base).await;
    initialize(&base, &endpoint, &mut sse).await;

    let ack = post_rpc(
        &base,
        &endpoint,
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
    )
    .await;
    assert_eq!(ack.status(), 200);

    let quiet = tokio::time::timeout(Duration::from_millis(500), sse.next_json()).await;
    assert!(quiet.is_err(), "Notification must not produce a response frame");
}

#[tokio::test]
async fn test_two_sessions_route_independently() {
    let (base, _state) = spawn_gateway().await;
    let (mut first, first_endpoint) = open_session(&base).await;
    let (mut second, second_endpoint) = open_session(&base).await;
    assert_ne!(first_endpoint, second_endpoint);

    // An addressed POST reaches the older stream even though a newer
    // one was opened afterwards.
    post_rpc(
        &base,
        &first_endpoint,
        json!({"jsonrpc": "2.0", "id": 7, "method": "initialize"}),
    )
    .await;
    let response = first.next_json().await;
    assert_eq!(response["id"], 7);

    post_rpc(
        &base,
        &second_endpoint,
        json!({"jsonrpc": "2.0", "id": 8, "method": "initialize"}),
    )
    .await;
    let response = second.next_json().await;
    assert_eq!(response["id"], 8);
}

#[tokio::test]
async fn test_rejects_invalid_post_bodies() {
    let (base, _state) = spawn_gateway().await;
    let client = reqwest::Client::new();

    // Unparsable body
    let response = client
        .post(format!("{}/messages", base))
        .header("content-type", "application/json")
        .body("{oops")
        .send()
        .await
        .expect("POST");
    assert_eq!(response.status(), 400);

    // Parsable but not an object
    let response = client
        .post(format!("{}/messages", base))
        .json(&json!(["not", "an", "object"]))
        .send()
        .await
        .expect("POST");
    assert_eq!(response.status(), 400);

    // Valid body with no live session to route to
    let response = client
        .post(format!("{}/messages", base))
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}))
        .send()
        .await
        .expect("POST");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("body");
    assert_eq!(body["error"], "No active session");
}

#[tokio::test]
async fn test_health_and_root_endpoints() {
    let (base, state) = spawn_gateway().await;
    let (_sse, _endpoint) = open_session(&base).await;
    assert_eq!(state.registry.len(), 1);

    let health: Value = reqwest::get(format!("{}/health", base))
        .await
        .expect("GET /health")
        .json()
        .await
        .expect("health body");
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["driver"], "connected");
    assert_eq!(health["connections"], 1);

    let root: Value = reqwest::get(base)
        .await
        .expect("GET /")
        .json()
        .await
        .expect("root body");
    assert_eq!(root["protocol"], "MCP over SSE");
    assert_eq!(root["version"], "2024-11-05");
}

#[tokio::test]
async fn test_disconnect_clears_session() {
    let (base, state) = spawn_gateway().await;
    let (sse, _endpoint) = open_session(&base).await;
    assert_eq!(state.registry.len(), 1);

    // Hang up; the server notices when it next touches the stream.
    drop(sse);
    for _ in 0..50 {
        if state.registry.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(state.registry.is_empty(), "Session should be torn down on disconnect");
}
