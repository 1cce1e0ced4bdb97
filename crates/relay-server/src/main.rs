//! grafana-relay - relays Grafana alert webhooks into chat rooms.
//!
//! ## Usage
//!
//! ```bash
//! grafana-relay init-config --output relay.toml
//! grafana-relay serve --config relay.toml
//! ```
//!
//! With `command_bridge = true`, chat commands are read from stdin as JSON
//! lines and answered on stdout; logs go to stderr.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use relay_server::{RelayConfig, RelayServer, SAMPLE_CONFIG, bridge};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "grafana_relay=info,relay_=info";

#[derive(Parser)]
#[command(name = "grafana-relay")]
#[command(about = "Relay Grafana alert webhooks into chat rooms")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true, env = "GRAFANA_RELAY_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server
    Serve {
        /// Path to config file
        #[arg(short, long, env = "GRAFANA_RELAY_CONFIG", default_value = "/etc/grafana-relay/config.toml")]
        config: PathBuf,
    },

    /// Write a sample config file
    InitConfig {
        /// Path to write config
        #[arg(short, long, default_value = "grafana-relay.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_writer(io::stderr))
            .try_init()?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json)?;

    match cli.command {
        Commands::Serve { config } => serve(config).await,
        Commands::InitConfig { output, force } => init_config(&output, force),
    }
}

async fn serve(config_path: PathBuf) -> anyhow::Result<()> {
    info!(config = %config_path.display(), "starting grafana-relay");

    let config = RelayConfig::from_file(&config_path)?;
    info!(
        bind_addr = %config.bind_addr,
        public_url = %config.public_url,
        admins = config.admins.len(),
        "loaded config"
    );

    let server = RelayServer::from_config(&config)?;

    if config.command_bridge {
        let commands = server.commands();
        tokio::spawn(async move {
            if let Err(e) = bridge::run_stdio(&commands).await {
                error!(error = %e, "command bridge failed");
            }
        });
    }

    server
        .serve_with_shutdown(config.bind_addr, shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

fn init_config(output: &Path, force: bool) -> anyhow::Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists, pass --force to overwrite",
            output.display()
        );
    }

    std::fs::write(output, SAMPLE_CONFIG)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("Config written to {}", output.display());
    println!();
    println!("Set public_url and the [chat] section, then run:");
    println!("  grafana-relay serve --config {}", output.display());
    Ok(())
}
