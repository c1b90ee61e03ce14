//! MCP-over-SSE gateway server for WxBridge.
//!
//! Bridges a one-way SSE push channel with an out-of-band POST request
//! channel, speaking JSON-RPC 2.0 (MCP revision `2024-11-05`) on top.
//! Tool calls are forwarded to an [`wxbridge_automation::Automation`]
//! driver injected at startup.

pub mod connection;
pub mod dispatch;
pub mod error;
pub mod rpc;
pub mod server;
pub mod tools;

pub use connection::{Connection, ConnectionGuard, ConnectionRegistry, SessionState};
pub use dispatch::Dispatcher;
pub use error::GatewayError;
pub use server::{Gateway, GatewayState};

/// Gateway result type.
pub type Result<T> = std::result::Result<T, GatewayError>;
