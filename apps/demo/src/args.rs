use clap::Parser;
use ehub::lifecycle::ApplicationStatus;
use std::path::PathBuf;

/// Command line of the demo binary.
#[derive(Debug, Parser)]
#[command(name = "ehub-demo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Drives a simulated application lifecycle through the event hub")]
pub struct Cli {
    /// Configuration file, extension optional. Built-in defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// How many times the lifecycle script is replayed
    #[arg(long, default_value_t = 3)]
    pub cycles: u32,

    /// Comma-separated statuses the simulated platform walks through
    #[arg(
        long,
        value_delimiter = ',',
        value_parser = ApplicationStatus::parse,
        default_value = "active,inactive,background,inactive,active"
    )]
    pub script: Vec<ApplicationStatus>,
}
