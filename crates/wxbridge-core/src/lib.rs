//! # wxbridge-core
//!
//! Core types and configuration for WxBridge.
//!
//! This crate provides the pieces shared across all WxBridge crates:
//!
//! - **Configuration**: Loading, validation, and layering of config files
//! - **Types**: Common type definitions for chat records and driver status

pub mod config;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
