//! HTTP driver for the desktop automation agent.
//!
//! The bridge never touches the WeChat UI itself; a small agent process runs
//! next to the WeChat desktop client and exposes the automation primitives
//! over local HTTP. This driver is the client side of that API:
//!
//! - `POST /api/send`      send a message
//! - `POST /api/messages`  read a conversation's loaded history
//! - `GET  /api/contacts`  list visible sessions
//! - `GET  /api/status`    connectivity probe
//!
//! Prerequisites:
//! - The automation agent must be running and logged into WeChat
//! - `driver.agent_url` must point at it (default `http://127.0.0.1:19088`)

use crate::error::AutomationError;
use crate::traits::Automation;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use wxbridge_core::config::DriverConfig;
use wxbridge_core::types::{ChatMessage, DriverStatus};

/// Automation driver backed by the desktop agent's HTTP API.
#[derive(Debug, Clone)]
pub struct AgentDriver {
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct SendPayload<'a> {
    to: &'a str,
    message: &'a str,
    mentions: &'a [String],
}

#[derive(Debug, Serialize)]
struct HistoryPayload<'a> {
    chat: &'a str,
    load_more: bool,
}

#[derive(Debug, Deserialize)]
struct AgentAck {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ContactsResponse {
    #[serde(default)]
    contacts: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    connected: bool,
}

impl AgentDriver {
    /// Create a driver talking to the agent at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AutomationError::Config(
                "agent base URL must not be empty".to_string(),
            ));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    /// Create a driver from the driver configuration section.
    pub fn from_config(config: &DriverConfig) -> Result<Self> {
        Self::new(&config.agent_url, config.timeout())
    }

    /// The agent base URL this driver talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read an acknowledgement body, surfacing agent-reported failures.
    async fn check_ack(response: reqwest::Response) -> Result<()> {
        let ack: AgentAck = response.json().await?;
        if ack.success {
            Ok(())
        } else {
            Err(AutomationError::agent(
                ack.error
                    .unwrap_or_else(|| "agent reported failure".to_string()),
            ))
        }
    }

    /// Turn a non-success HTTP status into an agent error carrying the body.
    async fn status_error(context: &str, response: reqwest::Response) -> AutomationError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        AutomationError::agent(format!("{} failed ({}): {}", context, status, body))
    }
}

#[async_trait]
impl Automation for AgentDriver {
    fn name(&self) -> &str {
        "agent"
    }

    async fn send_message(&self, to: &str, text: &str, mentions: &[String]) -> Result<()> {
        let payload = SendPayload {
            to,
            message: text,
            mentions,
        };

        debug!("agent send to {}", to);
        let response = self
            .client
            .post(self.url("/api/send"))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::status_error("send", response).await);
        }

        Self::check_ack(response).await
    }

    async fn list_messages(&self, who: &str, load_more: bool) -> Result<Vec<ChatMessage>> {
        let payload = HistoryPayload {
            chat: who,
            load_more,
        };

        debug!("agent history for {} (load_more: {})", who, load_more);
        let response = self
            .client
            .post(self.url("/api/messages"))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::status_error("history", response).await);
        }

        let history: HistoryResponse = response.json().await?;
        Ok(history.messages)
    }

    async fn list_contacts(&self) -> Result<Vec<String>> {
        debug!("agent contact listing");
        let response = self.client.get(self.url("/api/contacts")).send().await?;

        if !response.status().is_success() {
            return Err(Self::status_error("contacts", response).await);
        }

        let contacts: ContactsResponse = response.json().await?;
        Ok(contacts.contacts)
    }

    async fn health(&self) -> Result<DriverStatus> {
        match self.client.get(self.url("/api/status")).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<StatusResponse>().await {
                    Ok(status) if status.connected => Ok(DriverStatus::connected()),
                    Ok(_) => Ok(DriverStatus::disconnected(
                        "agent reports WeChat not connected",
                    )),
                    Err(e) => Ok(DriverStatus::disconnected(format!(
                        "bad status payload: {}",
                        e
                    ))),
                }
            }
            Ok(response) => Ok(DriverStatus::disconnected(format!(
                "agent returned {}",
                response.status()
            ))),
            Err(e) => Ok(DriverStatus::disconnected(e.to_string())),
        }
    }
}
