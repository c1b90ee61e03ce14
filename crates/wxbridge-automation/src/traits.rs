//! Core automation driver trait.

use crate::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use wxbridge_core::types::{ChatMessage, DriverStatus};

/// A WeChat automation backend.
///
/// Implementations perform the actual desktop-side actions. The trait is
/// deliberately raw: drivers report what WeChat shows, and any shaping
/// (truncation, filtering, formatting) belongs to the caller.
#[async_trait]
pub trait Automation: Send + Sync + Debug {
    /// Short identifier for logs and status output.
    fn name(&self) -> &str;

    /// Deliver a text message to a contact or group chat.
    ///
    /// `mentions` lists group members to @-mention; empty means none.
    async fn send_message(&self, to: &str, text: &str, mentions: &[String]) -> Result<()>;

    /// Read the currently loaded history of one conversation.
    ///
    /// With `load_more` the driver scrolls further back before reading.
    async fn list_messages(&self, who: &str, load_more: bool) -> Result<Vec<ChatMessage>>;

    /// List the session names currently visible in the chat sidebar.
    async fn list_contacts(&self) -> Result<Vec<String>>;

    /// Probe connectivity to the automation backend.
    async fn health(&self) -> Result<DriverStatus>;
}
