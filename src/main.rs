//! TermGate — allowlist-gated file and command backend for a browser terminal.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use termgate_core::TermGateConfig;
use termgate_policy::Policy;

#[derive(Parser)]
#[command(name = "termgate", version, about)]
struct Cli {
    /// Path to config.toml (default: ~/.termgate/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the gateway server.
    Serve {
        /// Bind address override.
        #[arg(long)]
        host: Option<String>,
        /// Port override.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Validate the config and policy, then exit.
    Check,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<TermGateConfig> {
    match path {
        Some(p) => TermGateConfig::load_from(p)
            .with_context(|| format!("loading config from {}", p.display())),
        None => TermGateConfig::load().context("loading default config"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("termgate=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { host, port } => {
            let mut config = load_config(cli.config.as_ref())?;
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }

            let policy = Policy::from_config(&config.policy).context("invalid policy")?;
            tracing::info!(
                roots = policy.allowed_roots().len(),
                commands = policy.command_prefixes().len(),
                "policy loaded"
            );
            termgate_gateway::start(config, policy).await
        }
        Command::Check => {
            let config = load_config(cli.config.as_ref())?;
            let policy = Policy::from_config(&config.policy).context("invalid policy")?;
            println!(
                "config ok: {} allowed root(s), {} command prefix(es)",
                policy.allowed_roots().len(),
                policy.command_prefixes().len()
            );
            Ok(())
        }
    }
}
