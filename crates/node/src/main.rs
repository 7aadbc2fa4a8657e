//! Sensor Node - Main Entry Point

use anyhow::Context;
use node::{init_logging, run, NodeConfig, SENSOR_KIND};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = NodeConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    init_logging(&config.log_level).context("Failed to set tracing subscriber")?;

    info!("=== Sensor Node v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Starting up with {} sensor...", SENSOR_KIND);

    run(config).await?;

    Ok(())
}
