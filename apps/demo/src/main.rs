mod args;
mod scenario;

use crate::args::Cli;
use anyhow::Context;
use clap::Parser;
use ehub::config::{HubConfig, load_config};
use ehub::start_logger;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config: HubConfig = match &cli.config {
        Some(path) => load_config(Some(path)).context("Critical: Configuration is malformed")?,
        None => HubConfig::default(),
    };

    let logger = start_logger(&config.logger)?;
    info!(cycles = cli.cycles, steps = cli.script.len(), "Starting lifecycle walkthrough");

    let report = scenario::run(&config, &cli.script, cli.cycles)?;
    info!(?report, "Walkthrough finished");

    logger.shutdown();
    Ok(())
}
