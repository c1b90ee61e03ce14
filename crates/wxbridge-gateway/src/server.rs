//! HTTP server exposing the session protocol over SSE.

use crate::connection::{ConnectionGuard, ConnectionRegistry};
use crate::dispatch::{Dispatcher, PROTOCOL_VERSION};
use crate::error::GatewayError;
use crate::rpc::JsonRpcResponse;
use crate::Result;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{sse::Event, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, trace, warn};
use wxbridge_automation::Automation;
use wxbridge_core::config::ServerConfig;

/// Idle time after which a comment-only heartbeat frame is emitted.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Shared server state handed to every handler.
pub struct GatewayState {
    /// Live session table.
    pub registry: Arc<ConnectionRegistry>,

    /// JSON-RPC dispatcher.
    pub dispatcher: Arc<Dispatcher>,

    /// Automation driver, probed by the health endpoint.
    pub driver: Arc<dyn Automation>,
}

impl GatewayState {
    /// Build the shared state around an automation driver.
    pub fn new(driver: Arc<dyn Automation>) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            dispatcher: Arc::new(Dispatcher::new(driver.clone())),
            driver,
        }
    }
}

/// The MCP-over-SSE gateway server.
pub struct Gateway {
    state: Arc<GatewayState>,
    bind_addr: String,
}

impl Gateway {
    /// Create a gateway bound to the configured address.
    pub fn new(config: &ServerConfig, driver: Arc<dyn Automation>) -> Self {
        Self {
            state: Arc::new(GatewayState::new(driver)),
            bind_addr: config.bind_addr(),
        }
    }

    /// Shared state handle, mainly for tests and embedding.
    pub fn state(&self) -> Arc<GatewayState> {
        self.state.clone()
    }

    /// Run the server until the process is stopped.
    pub async fn run(&self) -> Result<()> {
        // One startup probe; a dead driver degrades (visible in /health)
        // instead of aborting.
        match self.state.driver.health().await {
            Ok(status) if status.connected => {
                info!("Automation driver ready: {}", self.state.driver.name())
            }
            Ok(status) => warn!(
                "Automation driver not connected: {}",
                status.detail.unwrap_or_default()
            ),
            Err(e) => warn!("Automation driver probe failed: {}", e),
        }

        let app = router(self.state.clone());

        info!("Starting wxbridge server on {}", self.bind_addr);
        info!("SSE endpoint: http://{}/sse", self.bind_addr);
        info!("Message endpoint: http://{}/messages", self.bind_addr);

        let listener = tokio::net::TcpListener::bind(&self.bind_addr)
            .await
            .map_err(GatewayError::Io)?;
        axum::serve(listener, app)
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        Ok(())
    }
}

/// Build the Axum router over shared state.
pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/sse", get(sse_handler))
        .route("/messages", post(messages_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// One frame on a session's event stream.
#[derive(Debug, Clone, PartialEq)]
enum Frame {
    /// Advertises where out-of-band requests should be POSTed.
    Endpoint(String),

    /// A queued protocol envelope.
    Data(JsonRpcResponse),

    /// Comment-only keep-alive emitted after an idle window.
    Heartbeat,
}

impl Frame {
    fn into_event(self) -> Event {
        match self {
            Frame::Endpoint(path) => Event::default().event("endpoint").data(path),
            Frame::Data(envelope) => {
                Event::default().data(serde_json::to_string(&envelope).unwrap_or_default())
            }
            Frame::Heartbeat => Event::default().comment("heartbeat"),
        }
    }
}

fn endpoint_path(session_id: &str) -> String {
    format!("/messages?session_id={}", session_id)
}

/// The transport loop for one session: endpoint advertisement first,
/// then queued envelopes, with a heartbeat per idle window. Ends when
/// the queue closes; the guard removes the registration on every exit
/// path, including the client dropping the stream mid-wait.
fn frame_stream(
    mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>,
    endpoint: String,
    heartbeat: Duration,
    guard: ConnectionGuard,
) -> impl Stream<Item = Frame> {
    async_stream::stream! {
        let _guard = guard;
        yield Frame::Endpoint(endpoint);
        loop {
            match tokio::time::timeout(heartbeat, rx.recv()).await {
                Ok(Some(envelope)) => yield Frame::Data(envelope),
                Ok(None) => break,
                Err(_) => {
                    trace!("Idle window elapsed, sending heartbeat");
                    yield Frame::Heartbeat;
                }
            }
        }
    }
}

async fn sse_handler(
    State(state): State<Arc<GatewayState>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (connection, rx) = state.registry.create();
    info!("New SSE session: {}", connection.id);

    let guard = ConnectionGuard::new(state.registry.clone(), connection.id.clone());
    let frames = frame_stream(rx, endpoint_path(&connection.id), HEARTBEAT_INTERVAL, guard);
    Sse::new(frames.map(|frame| Ok(frame.into_event())))
}

#[derive(Debug, Deserialize)]
struct MessagesQuery {
    session_id: Option<String>,
}

async fn messages_handler(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<MessagesQuery>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let envelope: Value = match serde_json::from_slice::<Value>(&body) {
        Ok(value) if value.is_object() => value,
        Ok(_) => {
            warn!("Rejected message body that is not a JSON object");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Body must be a JSON object"})),
            );
        }
        Err(e) => {
            warn!("Rejected unparsable message body: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Invalid JSON body"})),
            );
        }
    };

    // Explicit session addressing when the advertised query parameter is
    // echoed back; otherwise the most recent stream wins (legacy
    // clients that POST to a bare /messages).
    let connection = match query.session_id.as_deref() {
        Some(id) => state.registry.get(id),
        None => state.registry.most_recent(),
    };
    let connection = match connection {
        Some(connection) => connection,
        None => {
            warn!("No active SSE session for incoming message");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "No active session"})),
            );
        }
    };

    debug!("Scheduling envelope for session {}", connection.id);
    let dispatcher = state.dispatcher.clone();
    tokio::spawn(async move {
        dispatcher.dispatch(&connection, envelope).await;
    });

    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn health_handler(State(state): State<Arc<GatewayState>>) -> Json<Value> {
    let connections = state.registry.len();
    match state.driver.health().await {
        Ok(status) if status.connected => Json(json!({
            "status": "healthy",
            "connections": connections,
            "driver": "connected",
        })),
        Ok(status) => Json(json!({
            "status": "unhealthy",
            "connections": connections,
            "driver": "disconnected",
            "error": status
                .detail
                .unwrap_or_else(|| "driver not connected".to_string()),
        })),
        Err(e) => Json(json!({
            "status": "unhealthy",
            "connections": connections,
            "driver": "disconnected",
            "error": e.to_string(),
        })),
    }
}

async fn root_handler(State(state): State<Arc<GatewayState>>) -> Json<Value> {
    Json(json!({
        "message": "WxBridge MCP Server (SSE)",
        "protocol": "MCP over SSE",
        "version": PROTOCOL_VERSION,
        "endpoints": {
            "sse": "/sse (GET for SSE stream)",
            "messages": "/messages (POST for JSON-RPC messages)",
        },
        "connections": state.registry.len(),
    }))
}
