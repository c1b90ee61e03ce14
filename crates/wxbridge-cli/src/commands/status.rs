//! Status command.

use crate::commands::load_config;
use clap::Args;
use serde_json::Value;
use std::net::TcpStream;
use std::path::PathBuf;

/// Status command arguments.
#[derive(Args)]
pub struct StatusArgs {
    /// Port to probe
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Print the raw health payload as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the status command.
pub async fn run(args: StatusArgs, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path.as_ref())?;
    let port = args.port.unwrap_or(config.server.port);

    if TcpStream::connect(format!("127.0.0.1:{}", port)).is_err() {
        println!("Gateway is not running (port {}).", port);
        return Ok(());
    }

    let url = format!("http://127.0.0.1:{}/health", port);
    let health: Value = reqwest::get(&url).await?.json().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&health)?);
        return Ok(());
    }

    println!("Gateway is running on port {}", port);
    println!(
        "  Status: {}",
        health["status"].as_str().unwrap_or("unknown")
    );
    println!(
        "  Driver: {}",
        health["driver"].as_str().unwrap_or("unknown")
    );
    println!(
        "  Active SSE sessions: {}",
        health["connections"].as_u64().unwrap_or(0)
    );
    if let Some(error) = health["error"].as_str() {
        println!("  Error: {}", error);
    }

    Ok(())
}
