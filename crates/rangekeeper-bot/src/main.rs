//! Rangekeeper strategy bot - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Autonomous concentrated-liquidity rebalancer for a USDC/WETH pool.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via RANGEKEEPER_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    rangekeeper_telemetry::init_logging()?;

    info!("starting rangekeeper v{}", env!("CARGO_PKG_VERSION"));

    let config = rangekeeper_bot::AppConfig::load(args.config.as_deref())?;
    info!(?config.twap_deviation_ticks, ?config.width_ticks_min, ?config.width_ticks_max, "configuration loaded");

    let mut app = rangekeeper_bot::Application::new(config).await?;

    app.run().await?;

    Ok(())
}
