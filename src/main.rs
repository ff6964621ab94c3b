//! Asset registry harness
//!
//! Runs the actor against an in-process broker bound to the configured
//! endpoint. Peers must live in the same process, so this binary is a local
//! harness for the actor lifecycle, not a networked service.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use asset_registry::bus::InProcessBroker;
use asset_registry::config::file::read_config_file;
use asset_registry::{AssetActor, AssetConfig};

/// Asset registry harness - runs the device inventory actor on an in-process bus
#[derive(Parser)]
#[command(name = "asset-registry", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "ASSET_REGISTRY_CONFIG")]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Enable the actor's verbose diagnostics from the start
    #[arg(long)]
    verbose_actor: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,asset_registry=info",
        1 => "info,asset_registry=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let text = read_config_file(&cli.config)?;
    let config = AssetConfig::parse(&text)?;
    let endpoint = config
        .endpoint()
        .ok_or_else(|| anyhow::anyhow!("bus endpoint is missing from {}", cli.config.display()))?;

    tracing::info!(
        endpoint,
        config = %cli.config.display(),
        "starting asset registry on an in-process broker; only same-process peers can connect"
    );

    let broker = InProcessBroker::bind(endpoint);
    let actor = AssetActor::spawn(Arc::new(broker));

    if cli.verbose_actor {
        actor.verbose().await?;
    }
    actor.configure(&text).await?;
    actor.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");

    actor.terminate().await?;
    Ok(())
}
