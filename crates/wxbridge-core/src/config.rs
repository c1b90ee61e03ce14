//! Configuration loading and management.
//!
//! Configuration is layered: JSON5 file, then `WXBRIDGE_*` environment
//! variables, then CLI flags (applied by the binary). Every layer is
//! optional; the defaults run a bridge on `0.0.0.0:25007` talking to a
//! desktop agent on localhost.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main WxBridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Automation driver settings.
    #[serde(default)]
    pub driver: DriverConfig,
}

/// HTTP server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port number.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Socket address string in `host:port` form.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    25007
}

/// Automation driver configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Which driver to run.
    #[serde(default)]
    pub kind: DriverKind,

    /// Base URL of the desktop automation agent (http driver only).
    #[serde(default = "default_agent_url")]
    pub agent_url: String,

    /// Request timeout towards the agent, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            kind: DriverKind::default(),
            agent_url: default_agent_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DriverConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_agent_url() -> String {
    "http://127.0.0.1:19088".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Driver selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriverKind {
    /// Talk to the desktop automation agent over HTTP.
    #[default]
    Http,

    /// In-memory stand-in; no WeChat installation required.
    DryRun,
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverKind::Http => write!(f, "http"),
            DriverKind::DryRun => write!(f, "dry-run"),
        }
    }
}

impl FromStr for DriverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(DriverKind::Http),
            "dry-run" => Ok(DriverKind::DryRun),
            other => Err(format!(
                "unknown driver '{}', expected 'http' or 'dry-run'",
                other
            )),
        }
    }
}

/// Get the WxBridge base directory (~/.wxbridge).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".wxbridge"))
}

/// Get the main config file path (~/.wxbridge/wxbridge.json5).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("wxbridge.json5"))
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Load configuration from the default path, falling back to defaults
    /// if no file exists.
    pub fn load_or_default() -> Self {
        match Self::load_default() {
            Ok(config) => config,
            Err(ConfigError::NotFound(_)) => Self::default(),
            Err(e) => {
                tracing::warn!("Ignoring unreadable config file: {}", e);
                Self::default()
            }
        }
    }

    /// Apply `WXBRIDGE_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    fn apply_overrides_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(host) = get("WXBRIDGE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("WXBRIDGE_PORT") {
            match port.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid WXBRIDGE_PORT '{}'", port),
            }
        }
        if let Some(kind) = get("WXBRIDGE_DRIVER") {
            match kind.parse::<DriverKind>() {
                Ok(kind) => self.driver.kind = kind,
                Err(e) => tracing::warn!("Ignoring WXBRIDGE_DRIVER: {}", e),
            }
        }
        if let Some(url) = get("WXBRIDGE_AGENT_URL") {
            self.driver.agent_url = url;
        }
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.server.host.is_empty() {
            errors.push("Server host must not be empty".to_string());
        }
        if self.server.port == 0 {
            errors.push("Server port cannot be 0".to_string());
        }

        if self.driver.timeout_secs == 0 {
            errors.push("Driver timeout cannot be 0".to_string());
        }

        if self.driver.kind == DriverKind::Http {
            match url::Url::parse(&self.driver.agent_url) {
                Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
                Ok(url) => errors.push(format!(
                    "agent_url must use http or https, got '{}'",
                    url.scheme()
                )),
                Err(e) => errors.push(format!(
                    "Invalid agent_url '{}': {}",
                    self.driver.agent_url, e
                )),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }
}

/// Configuration builder for creating configs programmatically.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new config builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    /// Set the server port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Set the driver kind.
    pub fn driver(mut self, kind: DriverKind) -> Self {
        self.config.driver.kind = kind;
        self
    }

    /// Set the automation agent base URL.
    pub fn agent_url(mut self, url: impl Into<String>) -> Self {
        self.config.driver.agent_url = url.into();
        self
    }

    /// Set the agent request timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.driver.timeout_secs = secs;
        self
    }

    /// Build the config.
    pub fn build(self) -> Config {
        self.config
    }

    /// Validate and build the config, returning an error if validation fails.
    pub fn build_validated(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
