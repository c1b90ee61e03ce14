//! In-memory driver for development and tests.
//!
//! Records every send and serves seeded history and contacts, so the whole
//! bridge can run without a WeChat installation. Sent messages are echoed
//! into the conversation's history under the sender name `me`.

use crate::traits::Automation;
use crate::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::info;
use wxbridge_core::types::{ChatMessage, DriverStatus};

/// A message recorded by [`DryRunDriver::send_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSend {
    pub to: String,
    pub text: String,
    pub mentions: Vec<String>,
}

/// In-memory automation driver.
#[derive(Debug, Default)]
pub struct DryRunDriver {
    sent: Mutex<Vec<RecordedSend>>,
    history: Mutex<HashMap<String, Vec<ChatMessage>>>,
    contacts: Mutex<Vec<String>>,
}

impl DryRunDriver {
    /// Create an empty dry-run driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the history of one conversation.
    pub fn seed_history(&self, who: impl Into<String>, messages: Vec<ChatMessage>) {
        self.history.lock().insert(who.into(), messages);
    }

    /// Seed the visible contact list.
    pub fn seed_contacts(&self, contacts: Vec<String>) {
        *self.contacts.lock() = contacts;
    }

    /// Messages recorded so far, oldest first.
    pub fn sent(&self) -> Vec<RecordedSend> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Automation for DryRunDriver {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn send_message(&self, to: &str, text: &str, mentions: &[String]) -> Result<()> {
        info!("dry-run send to {}: {}", to, text);
        self.sent.lock().push(RecordedSend {
            to: to.to_string(),
            text: text.to_string(),
            mentions: mentions.to_vec(),
        });
        self.history
            .lock()
            .entry(to.to_string())
            .or_default()
            .push(ChatMessage::new("me", text));
        Ok(())
    }

    async fn list_messages(&self, who: &str, _load_more: bool) -> Result<Vec<ChatMessage>> {
        Ok(self.history.lock().get(who).cloned().unwrap_or_default())
    }

    async fn list_contacts(&self) -> Result<Vec<String>> {
        Ok(self.contacts.lock().clone())
    }

    async fn health(&self) -> Result<DriverStatus> {
        Ok(DriverStatus::connected())
    }
}
