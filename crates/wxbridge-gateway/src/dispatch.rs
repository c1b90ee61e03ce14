//! JSON-RPC method dispatch and the session lifecycle state machine.

use crate::connection::Connection;
use crate::error::GatewayError;
use crate::rpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::tools;
use crate::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use wxbridge_automation::Automation;

/// MCP protocol revision advertised during the handshake.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name reported in the handshake descriptor.
pub const SERVER_NAME: &str = "wxbridge";

/// Routes client envelopes to method handlers and queues the outcome on
/// the session's outbound queue.
///
/// Every failure path ends in an error envelope; nothing here closes the
/// connection or escapes the dispatch task.
pub struct Dispatcher {
    driver: Arc<dyn Automation>,
}

impl Dispatcher {
    /// Create a dispatcher around an automation driver.
    pub fn new(driver: Arc<dyn Automation>) -> Self {
        Self { driver }
    }

    /// Handle one raw envelope for a session.
    ///
    /// Requests always produce exactly one queued response with the same
    /// id; notifications produce none.
    pub async fn dispatch(&self, connection: &Connection, raw: Value) {
        let fallback_id = raw.get("id").cloned();
        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(e) => {
                warn!("Malformed JSON-RPC envelope: {}", e);
                connection.push(JsonRpcResponse::error(
                    fallback_id,
                    JsonRpcError::invalid_request(e.to_string()),
                ));
                return;
            }
        };

        if request.is_notification() {
            self.notification(connection, &request);
            return;
        }

        debug!("Dispatching {} for session {}", request.method, connection.id);

        let id = request.id.clone();
        let response = match self.handle(connection, &request).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                warn!("Method {} failed: {}", request.method, e);
                JsonRpcResponse::error(id, JsonRpcError::new(e.code(), e.to_string()))
            }
        };
        connection.push(response);
    }

    async fn handle(&self, connection: &Connection, request: &JsonRpcRequest) -> Result<Value> {
        match request.method.as_str() {
            "initialize" => Ok(self.initialize(connection, request.params.as_ref())),
            // Everything below the handshake requires an initialized session.
            method if !connection.is_initialized() => {
                Err(GatewayError::NotInitialized(method.to_string()))
            }
            "ping" => Ok(json!({})),
            "tools/list" => {
                let tools = tools::catalog();
                info!("Returning tool catalog: {} tools", tools.len());
                Ok(json!({ "tools": tools }))
            }
            "tools/call" => self.tool_call(request.params.as_ref()).await,
            other => Err(GatewayError::MethodNotFound(other.to_string())),
        }
    }

    /// Record the handshake and return the fixed capability descriptor.
    /// Re-initialization is idempotent.
    fn initialize(&self, connection: &Connection, params: Option<&Value>) -> Value {
        let client_info = params.and_then(|p| p.get("clientInfo")).cloned();
        let client_name = client_info
            .as_ref()
            .and_then(|info| info.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown client")
            .to_string();
        connection.initialize(client_info);
        info!("Session {} initialized by {}", connection.id, client_name);

        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            }
        })
    }

    async fn tool_call(&self, params: Option<&Value>) -> Result<Value> {
        let params =
            params.ok_or_else(|| GatewayError::InvalidParams("missing params".to_string()))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::InvalidParams("missing tool name".to_string()))?;
        let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        let payload = tools::run_tool(&self.driver, name, &args).await?;
        tools::call_result(&payload)
    }

    fn notification(&self, connection: &Connection, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => {
                debug!("Session {} reported initialization complete", connection.id);
            }
            other => {
                debug!("Ignoring notification {} for session {}", other, connection.id);
            }
        }
    }
}
