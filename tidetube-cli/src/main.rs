//! Tidetube CLI - Command-line interface
//!
//! Publishes, imports and removes videos together with their artifacts.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use tidetube_core::TidetubeConfig;
use tidetube_core::config::StorageConfig;
use tidetube_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "tidetube")]
#[command(about = "Video artifact pipeline for a federated video platform")]
struct Cli {
    /// Console log level
    #[arg(long, global = true, value_enum, default_value_t = CliLogLevel::Warn)]
    log_level: CliLogLevel,

    /// Storage root, overrides TIDETUBE_STORAGE_ROOT
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), None)?;

    let mut config = TidetubeConfig::from_env();
    if let Some(root) = cli.storage {
        config.storage = StorageConfig::rooted_at(&root);
    }

    if let Err(e) = commands::handle_command(config, cli.command).await {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e.user_message());
        std::process::exit(if e.is_user_error() { 2 } else { 1 });
    }

    Ok(())
}
