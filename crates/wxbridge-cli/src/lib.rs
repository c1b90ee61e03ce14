//! WxBridge command-line interface.

pub mod commands;

use clap::{Parser, Subcommand};

/// WxBridge - WeChat automation MCP gateway
#[derive(Parser)]
#[command(name = "wxbridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "WXBRIDGE_CONFIG")]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the MCP gateway server
    Serve(commands::serve::ServeArgs),

    /// Show gateway status
    Status(commands::status::StatusArgs),

    /// Run diagnostics
    Doctor(commands::doctor::DoctorArgs),

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve(args) => commands::serve::run(args, cli.config).await,
        Commands::Status(args) => commands::status::run(args, cli.config).await,
        Commands::Doctor(args) => commands::doctor::run(args, cli.config).await,
        Commands::Version => {
            println!("wxbridge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
