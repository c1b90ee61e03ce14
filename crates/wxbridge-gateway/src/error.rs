//! Gateway error types.

use thiserror::Error;

/// Errors surfaced by the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Method not found.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Invalid method parameters.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Request received before the initialize handshake.
    #[error("Server not initialized: {0}")]
    NotInitialized(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Map the error to its JSON-RPC error code.
    pub fn code(&self) -> i32 {
        match self {
            GatewayError::MethodNotFound(_) => -32601,
            GatewayError::InvalidParams(_) => -32602,
            GatewayError::NotInitialized(_) => -32002,
            _ => -32603,
        }
    }
}
