//! Diagnostic commands.

use crate::commands::{build_driver, load_config};
use clap::Args;
use console::{style, Emoji};
use std::net::TcpStream;
use std::path::PathBuf;
use wxbridge_core::config::DriverKind;

static CHECK: Emoji = Emoji("✓", "+");
static CROSS: Emoji = Emoji("✗", "x");
static WARN: Emoji = Emoji("⚠", "!");

/// Doctor command arguments.
#[derive(Args)]
pub struct DoctorArgs {
    /// Run all checks including slow ones
    #[arg(long)]
    pub full: bool,
}

/// Run the doctor command.
pub async fn run(args: DoctorArgs, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    println!("WxBridge Doctor\n");

    let mut errors = 0;
    let mut warnings = 0;

    // Check config
    println!("Checking configuration...");
    let config = match load_config(config_path.as_ref()) {
        Ok(config) => {
            println!("  {} Configuration loaded", style(CHECK).green());
            match config.validate() {
                Ok(_) => {
                    println!("  {} Configuration valid", style(CHECK).green());
                }
                Err(e) => {
                    println!("  {} Configuration invalid: {}", style(CROSS).red(), e);
                    errors += 1;
                }
            }
            Some(config)
        }
        Err(e) => {
            println!("  {} Configuration error: {}", style(CROSS).red(), e);
            errors += 1;
            None
        }
    };

    // Check environment overrides
    println!("\nChecking environment...");
    for name in [
        "WXBRIDGE_HOST",
        "WXBRIDGE_PORT",
        "WXBRIDGE_DRIVER",
        "WXBRIDGE_AGENT_URL",
    ] {
        match std::env::var(name) {
            Ok(value) => println!("  {} {} = {}", style(CHECK).green(), name, value),
            Err(_) => println!("  {} {} not set", style("-").dim(), name),
        }
    }

    if let Some(config) = &config {
        // Check automation driver
        println!("\nChecking automation driver...");
        println!("  Driver kind: {}", config.driver.kind);
        if config.driver.kind == DriverKind::Http {
            println!("  Agent URL: {}", config.driver.agent_url);
        }

        match build_driver(config) {
            Ok(driver) => {
                println!(
                    "  {} Driver constructed: {}",
                    style(CHECK).green(),
                    driver.name()
                );

                // Probing WeChat goes over the network, so it is gated
                // behind --full.
                if args.full {
                    match driver.health().await {
                        Ok(status) if status.connected => {
                            println!("  {} WeChat automation reachable", style(CHECK).green());
                        }
                        Ok(status) => {
                            println!(
                                "  {} WeChat automation not connected: {}",
                                style(WARN).yellow(),
                                status.detail.unwrap_or_default()
                            );
                            warnings += 1;
                        }
                        Err(e) => {
                            println!("  {} Driver probe failed: {}", style(CROSS).red(), e);
                            errors += 1;
                        }
                    }
                }
            }
            Err(e) => {
                println!("  {} Failed to construct driver: {}", style(CROSS).red(), e);
                errors += 1;
            }
        }

        // Check gateway connectivity
        if args.full {
            println!("\nChecking gateway connectivity...");
            let port = config.server.port;
            match TcpStream::connect(format!("127.0.0.1:{}", port)) {
                Ok(_) => {
                    println!(
                        "  {} Gateway is running on port {}",
                        style(CHECK).green(),
                        port
                    );
                }
                Err(_) => {
                    println!(
                        "  {} Gateway is not running (port {})",
                        style(WARN).yellow(),
                        port
                    );
                    warnings += 1;
                }
            }
        }
    }

    // Summary
    println!("\n{}", style("Summary").bold());
    println!(
        "  Errors: {}",
        if errors > 0 {
            style(errors).red()
        } else {
            style(errors).green()
        }
    );
    println!(
        "  Warnings: {}",
        if warnings > 0 {
            style(warnings).yellow()
        } else {
            style(warnings).green()
        }
    );

    if errors > 0 {
        anyhow::bail!("{} error(s) found", errors);
    }

    Ok(())
}
