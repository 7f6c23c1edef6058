//! Warden CLI - Main entry point

mod catalog;
mod replay;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_foundation::WardenConfig;

/// Warden - tool-call execution core diagnostics
#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Default log filter when RUST_LOG is not set
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a recorded chunk transcript through the decoder and resolver
    Replay {
        /// Transcript file (one chunk, finish object, or SSE data line per line)
        file: PathBuf,

        /// Print events and calls as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// List catalog tools with their required fields and aliases
    Catalog,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = WardenConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        WardenConfig::default()
    });

    match args.command {
        Command::Replay { file, json } => replay::run(&config, &file, json).await,
        Command::Catalog => {
            catalog::print(&config);
            Ok(())
        }
    }
}
