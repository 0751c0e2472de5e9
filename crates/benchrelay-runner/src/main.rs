//! benchrelay runner - worker entry point.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use benchrelay_runner::Cli;
use benchrelay_runner::config::RunnerConfig;
use benchrelay_runner::sequencer::RunSequencer;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = RunnerConfig::from_cli(&cli).context("invalid runner configuration")?;

    tracing::info!(
        instance = %config.instance_name,
        runs = config.runs.len(),
        server = %config.server_address,
        "starting benchmark run set"
    );

    let sequencer = RunSequencer::new(config);
    let outcomes = sequencer.run_all().await;

    tracing::info!(
        total = outcomes.len(),
        uploaded = outcomes.iter().filter(|o| o.uploaded).count(),
        "run set complete"
    );
    Ok(())
}
