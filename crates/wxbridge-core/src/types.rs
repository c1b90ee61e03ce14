//! Common type definitions shared across WxBridge crates.

use serde::{Deserialize, Serialize};

/// One chat record as reported by an automation driver.
///
/// Records are raw: the driver reports who said what, and any presentation
/// concerns (formatting, truncation) belong to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Display name of the sender.
    pub sender: String,

    /// Message body.
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat record.
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
        }
    }
}

/// Connectivity report from an automation driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverStatus {
    /// Whether the driver can currently reach its backend.
    pub connected: bool,

    /// Human-readable detail when something is off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl DriverStatus {
    /// A healthy, connected driver.
    pub fn connected() -> Self {
        Self {
            connected: true,
            detail: None,
        }
    }

    /// A driver that cannot reach its backend.
    pub fn disconnected(detail: impl Into<String>) -> Self {
        Self {
            connected: false,
            detail: Some(detail.into()),
        }
    }
}
