//! WeChat automation driver abstractions for WxBridge.
//!
//! This crate defines the [`Automation`] trait -- the seam between the
//! protocol layer and whatever actually drives WeChat -- plus the two
//! bundled drivers: [`AgentDriver`] (local HTTP agent next to the desktop
//! client) and [`DryRunDriver`] (in-memory, for development and tests).

pub mod agent;
pub mod dryrun;
pub mod error;
pub mod traits;

pub use agent::AgentDriver;
pub use dryrun::DryRunDriver;
pub use error::AutomationError;
pub use traits::Automation;

/// Result type for automation operations.
pub type Result<T> = std::result::Result<T, AutomationError>;
