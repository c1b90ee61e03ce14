//! Serve command.

use crate::commands::{build_driver, load_config};
use clap::Args;
use std::path::PathBuf;
use tracing::info;
use wxbridge_core::config::DriverKind;
use wxbridge_gateway::Gateway;

/// Serve command arguments.
#[derive(Args)]
pub struct ServeArgs {
    /// Bind address
    #[arg(long, env = "WXBRIDGE_HOST")]
    pub host: Option<String>,

    /// Port number
    #[arg(short, long, env = "WXBRIDGE_PORT")]
    pub port: Option<u16>,

    /// Automation driver (http, dry-run)
    #[arg(long)]
    pub driver: Option<String>,

    /// Desktop automation agent base URL
    #[arg(long, env = "WXBRIDGE_AGENT_URL")]
    pub agent_url: Option<String>,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = load_config(config_path.as_ref())?;

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(driver) = args.driver {
        match driver.parse::<DriverKind>() {
            Ok(kind) => config.driver.kind = kind,
            Err(e) => anyhow::bail!("Invalid --driver: {}", e),
        }
    }
    if let Some(url) = args.agent_url {
        config.driver.agent_url = url;
    }

    config.validate()?;

    let driver = build_driver(&config)?;
    info!("Using {} driver", driver.name());

    let gateway = Gateway::new(&config.server, driver);
    gateway.run().await?;

    Ok(())
}
