//! CLI command implementations.

pub mod doctor;
pub mod serve;
pub mod status;

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use wxbridge_automation::{AgentDriver, Automation, DryRunDriver};
use wxbridge_core::config::DriverKind;
use wxbridge_core::Config;

/// Load configuration with the standard precedence: file first, then
/// `WXBRIDGE_*` environment variables. Command-line flags are applied
/// on top by each command.
pub(crate) fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_or_default(),
    };
    config.apply_env_overrides();
    Ok(config)
}

/// Construct the automation driver selected by the configuration.
pub(crate) fn build_driver(config: &Config) -> anyhow::Result<Arc<dyn Automation>> {
    match config.driver.kind {
        DriverKind::Http => {
            let driver = AgentDriver::from_config(&config.driver)?;
            Ok(Arc::new(driver))
        }
        DriverKind::DryRun => Ok(Arc::new(DryRunDriver::new())),
    }
}
