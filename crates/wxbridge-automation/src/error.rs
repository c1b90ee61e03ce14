//! Automation driver error types.

use thiserror::Error;

/// Errors that can occur while driving the WeChat automation backend.
#[derive(Debug, Error)]
pub enum AutomationError {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Driver cannot reach its backend.
    #[error("Driver not connected: {0}")]
    NotConnected(String),

    /// The agent rejected or failed the operation.
    #[error("Agent error: {0}")]
    Agent(String),

    /// Unexpected payload from the agent.
    #[error("Invalid agent response: {0}")]
    InvalidResponse(String),

    /// Driver configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AutomationError {
    /// Create an agent-reported error.
    pub fn agent(message: impl Into<String>) -> Self {
        Self::Agent(message.into())
    }

    /// Create a not connected error.
    pub fn not_connected(message: impl Into<String>) -> Self {
        Self::NotConnected(message.into())
    }

    /// Create an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Check if this error is retriable.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::NotConnected(_) => true,
            _ => false,
        }
    }
}
