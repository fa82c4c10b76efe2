//! updraft CLI - drive firmware updates from the command line.
//!
//! Hosts the update workflow against a file-backed dual-bank store and a
//! stdout hub, for exercising the agent end to end against any HTTP file
//! server.

mod commands;
mod error;
mod hub;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::apply::ApplyArgs;
use commands::common::DeviceArgs;

#[derive(Parser)]
#[command(name = "updraft", version, about = "Dual-bank OTA update agent")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report the device to the service with an idle agent state
    Announce {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Process an update manifest and drive the install to completion
    Apply(ApplyArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Announce { device } => commands::announce::run(&device),
        Commands::Apply(args) => commands::apply::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
