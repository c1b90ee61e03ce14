//! Tool catalog and guarded execution against the automation driver.
//!
//! Argument validation failures are protocol errors raised before the
//! driver runs; driver failures are folded into the tool's own payload
//! as application-level results. Callers rely on that asymmetry.

use crate::error::GatewayError;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};
use wxbridge_automation::Automation;
use wxbridge_core::ChatMessage;

/// Most recent history entries returned per query.
const HISTORY_LIMIT: usize = 20;

/// WeChat pseudo-chats that are not real conversations.
const EXCLUDED_CHATS: &[&str] = &["折叠的群聊", "微信支付", "腾讯新闻", "微信运动", "朋友圈"];

/// Service accounts every WeChat install has.
const BUILTIN_CONTACTS: &[&str] = &["文件传输助手", "微信团队"];

/// Default seed for `get_contact_list`'s `known_contacts` argument.
const DEFAULT_KNOWN_CONTACTS: &[&str] = &["YINGJIE"];

/// Behavior hints surfaced with each tool, camelCase on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    pub title: &'static str,
    pub read_only_hint: bool,
    pub destructive_hint: bool,
    pub idempotent_hint: bool,
    pub open_world_hint: bool,
}

/// One entry of the `tools/list` catalog.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    #[serde(rename = "outputSchema")]
    pub output_schema: Value,
    pub annotations: ToolAnnotations,
}

/// The static three-tool catalog, identical on every call.
pub fn catalog() -> Vec<Tool> {
    vec![
        Tool {
            name: "send_message",
            description: "Send a WeChat message",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "msg": {
                        "type": "string",
                        "description": "Message text to send"
                    },
                    "to": {
                        "type": "string",
                        "description": "Recipient contact or group name"
                    },
                    "at": {
                        "anyOf": [
                            {"type": "string"},
                            {"type": "array", "items": {"type": "string"}}
                        ],
                        "description": "Group members to @-mention (optional)",
                        "default": null
                    }
                },
                "required": ["msg", "to"]
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "success": {"type": "boolean"},
                    "message": {"type": "string"}
                },
                "required": ["success", "message"]
            }),
            annotations: ToolAnnotations {
                title: "Send WeChat Message",
                read_only_hint: false,
                destructive_hint: false,
                idempotent_hint: false,
                open_world_hint: false,
            },
        },
        Tool {
            name: "get_all_messages",
            description: "Get recent WeChat chat history",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "who": {
                        "type": "string",
                        "description": "Contact or group chat name"
                    },
                    "load_more": {
                        "type": "boolean",
                        "description": "Load older messages before reading",
                        "default": false
                    }
                },
                "required": ["who"]
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "messages": {
                        "type": "array",
                        "items": {"type": "string"}
                    },
                    "count": {"type": "integer"}
                },
                "required": ["messages", "count"]
            }),
            annotations: ToolAnnotations {
                title: "Get WeChat Chat History",
                read_only_hint: true,
                destructive_hint: false,
                idempotent_hint: true,
                open_world_hint: false,
            },
        },
        Tool {
            name: "get_contact_list",
            description: "List visible WeChat contacts and group chats",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "include_known": {
                        "type": "boolean",
                        "description": "Include the seeded known contacts",
                        "default": true
                    },
                    "known_contacts": {
                        "type": "array",
                        "description": "Known contact names to seed the list",
                        "items": {"type": "string"},
                        "default": DEFAULT_KNOWN_CONTACTS
                    }
                },
                "required": []
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "contacts": {
                        "type": "array",
                        "items": {"type": "string"}
                    },
                    "total": {"type": "integer"}
                },
                "required": ["contacts", "total"]
            }),
            annotations: ToolAnnotations {
                title: "List WeChat Contacts",
                read_only_hint: true,
                destructive_hint: false,
                idempotent_hint: true,
                open_world_hint: false,
            },
        },
    ]
}

/// Execute one tool call. Returns the tool's structured payload; the
/// dispatcher wraps it via [`call_result`].
pub async fn run_tool(
    driver: &Arc<dyn Automation>,
    name: &str,
    args: &Value,
) -> Result<Value, GatewayError> {
    info!("Tool call: {} ({})", name, args);
    match name {
        "send_message" => send_message(driver, args).await,
        "get_all_messages" => get_all_messages(driver, args).await,
        "get_contact_list" => get_contact_list(driver, args).await,
        other => Err(GatewayError::InvalidParams(format!(
            "Unknown tool: {}",
            other
        ))),
    }
}

/// Wrap a tool payload as the single text content item the protocol
/// expects: `{content:[{type:"text", text:<pretty JSON>}]}`.
pub fn call_result(payload: &Value) -> Result<Value, GatewayError> {
    let text = serde_json::to_string_pretty(payload)
        .map_err(|e| GatewayError::Internal(e.to_string()))?;
    Ok(json!({"content": [{"type": "text", "text": text}]}))
}

async fn send_message(driver: &Arc<dyn Automation>, args: &Value) -> Result<Value, GatewayError> {
    let msg = required_str(args, "msg")?;
    let to = required_str(args, "to")?;
    let mentions = parse_mentions(args.get("at"));

    match driver.send_message(to, msg, &mentions).await {
        Ok(()) => Ok(json!({
            "success": true,
            "message": "Message sent successfully"
        })),
        Err(e) => {
            error!("send_message to {} failed: {}", to, e);
            Ok(json!({
                "success": false,
                "message": format!("Failed to send message: {}", e)
            }))
        }
    }
}

async fn get_all_messages(
    driver: &Arc<dyn Automation>,
    args: &Value,
) -> Result<Value, GatewayError> {
    let who = required_str(args, "who")?;
    let load_more = args.get("load_more").and_then(Value::as_bool).unwrap_or(false);

    match driver.list_messages(who, load_more).await {
        Ok(records) => {
            let messages = format_history(&records, who);
            Ok(json!({
                "count": messages.len(),
                "messages": messages
            }))
        }
        Err(e) => {
            error!("get_all_messages for {} failed: {}", who, e);
            Ok(json!({
                "messages": [format!("Failed to get messages: {}", e)],
                "count": 1
            }))
        }
    }
}

async fn get_contact_list(
    driver: &Arc<dyn Automation>,
    args: &Value,
) -> Result<Value, GatewayError> {
    let include_known = args
        .get("include_known")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    let known: Vec<String> = match args.get("known_contacts") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
        _ => DEFAULT_KNOWN_CONTACTS.iter().map(|s| s.to_string()).collect(),
    };

    match driver.list_contacts().await {
        Ok(discovered) => {
            let contacts = shape_contacts(discovered, include_known, &known);
            Ok(json!({
                "total": contacts.len(),
                "contacts": contacts
            }))
        }
        Err(e) => {
            error!("get_contact_list failed: {}", e);
            Ok(json!({
                "contacts": [format!("Failed to get contact list: {}", e)],
                "total": 1
            }))
        }
    }
}

/// Format history records as `"<sender>: <content>"` lines, capped to
/// the most recent [`HISTORY_LIMIT`]. Zero records become one
/// placeholder line.
fn format_history(records: &[ChatMessage], who: &str) -> Vec<String> {
    if records.is_empty() {
        return vec![format!("No chat history found with {}", who)];
    }
    let start = records.len().saturating_sub(HISTORY_LIMIT);
    records[start..]
        .iter()
        .map(|m| format!("{}: {}", m.sender, m.content))
        .collect()
}

/// Merge seeds, discovered sessions, and built-ins into one deduplicated
/// list with system pseudo-chats filtered out.
fn shape_contacts(discovered: Vec<String>, include_known: bool, known: &[String]) -> Vec<String> {
    let mut contacts: Vec<String> = Vec::new();
    if include_known {
        for name in known {
            if !name.is_empty() && !contacts.contains(name) {
                contacts.push(name.clone());
            }
        }
    }
    for name in discovered {
        if name.is_empty() || contacts.contains(&name) {
            continue;
        }
        if EXCLUDED_CHATS.contains(&name.as_str()) {
            continue;
        }
        contacts.push(name);
    }
    for builtin in BUILTIN_CONTACTS {
        if !contacts.iter().any(|c| c == builtin) {
            contacts.push((*builtin).to_string());
        }
    }
    if contacts.is_empty() {
        contacts.push("No contacts found".to_string());
    }
    contacts
}

/// `at` accepts a single name or a list; normalize to a list.
fn parse_mentions(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(name)) if !name.is_empty() => vec![name.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

fn required_str<'a>(args: &'a Value, field: &str) -> Result<&'a str, GatewayError> {
    args.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            GatewayError::InvalidParams(format!("parameter '{}' must be a non-empty string", field))
        })
}
