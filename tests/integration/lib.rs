//! Shared helpers for WxBridge integration tests.
//!
//! Provides a minimal SSE client built on reqwest's byte stream and a
//! spawner that runs the gateway router on an ephemeral port.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::pin::Pin;
use std::sync::Arc;
use wxbridge_automation::{Automation, DryRunDriver};
use wxbridge_gateway::server::{router, GatewayState};

/// One parsed SSE frame.
#[derive(Debug, Clone)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
    pub comments: Vec<String>,
}

impl SseEvent {
    fn parse(raw: &str) -> Self {
        let mut event = None;
        let mut data_lines = Vec::new();
        let mut comments = Vec::new();
        for line in raw.lines() {
            if let Some(rest) = line.strip_prefix("event:") {
                event = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("data:") {
                data_lines.push(rest.trim_start().to_string());
            } else if let Some(rest) = line.strip_prefix(':') {
                comments.push(rest.trim().to_string());
            }
        }
        Self {
            event,
            data: data_lines.join("\n"),
            comments,
        }
    }

    fn is_comment_only(&self) -> bool {
        self.event.is_none() && self.data.is_empty()
    }
}

/// A buffered SSE reader over a live `/sse` response.
pub struct SseClient {
    stream: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
    buffer: String,
}

impl SseClient {
    /// Open the SSE stream against a running gateway.
    pub async fn connect(base: &str) -> Self {
        let response = reqwest::Client::new()
            .get(format!("{}/sse", base))
            .send()
            .await
            .expect("failed to open SSE stream");
        assert!(
            response.status().is_success(),
            "SSE stream should open, got {}",
            response.status()
        );
        Self {
            stream: Box::pin(response.bytes_stream()),
            buffer: String::new(),
        }
    }

    /// Next full frame, skipping comment-only keep-alives.
    pub async fn next_event(&mut self) -> SseEvent {
        loop {
            if let Some(event) = self.pop_frame() {
                if event.is_comment_only() {
                    continue;
                }
                return event;
            }
            let chunk = self
                .stream
                .next()
                .await
                .expect("SSE stream ended unexpectedly")
                .expect("SSE read error");
            self.buffer.push_str(&String::from_utf8_lossy(&chunk));
        }
    }

    /// Next data frame decoded as JSON.
    pub async fn next_json(&mut self) -> Value {
        let event = self.next_event().await;
        serde_json::from_str(&event.data)
            .unwrap_or_else(|e| panic!("frame is not JSON ({}): {}", e, event.data))
    }

    fn pop_frame(&mut self) -> Option<SseEvent> {
        let end = self.buffer.find("\n\n")?;
        let raw: String = self.buffer.drain(..end + 2).collect();
        Some(SseEvent::parse(raw.trim_end()))
    }
}

/// Run the gateway on an ephemeral local port with a fresh dry-run
/// driver. Returns the base URL and the shared state for inspection.
pub async fn spawn_gateway() -> (String, Arc<GatewayState>) {
    spawn_gateway_with(Arc::new(DryRunDriver::new())).await
}

/// Run the gateway on an ephemeral local port with the given driver.
pub async fn spawn_gateway_with(driver: Arc<dyn Automation>) -> (String, Arc<GatewayState>) {
    let state = Arc::new(GatewayState::new(driver));
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server error");
    });

    (format!("http://{}", addr), state)
}

/// POST a JSON-RPC payload to the advertised message endpoint.
pub async fn post_rpc(base: &str, endpoint: &str, payload: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}{}", base, endpoint))
        .json(&payload)
        .send()
        .await
        .expect("failed to POST message")
}
