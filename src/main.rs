//! Keyclip CLI
//!
//! Trim a video to a time range and optionally un-skew every frame with a
//! four-point keystone correction, re-encoding on the best available
//! encoder backend while preserving the original audio.
//!
//! # Usage
//!
//! ```bash
//! keyclip clip --input talk.mp4 --start 00:02:00 --end 00:05:00
//! keyclip clip --input talk.mp4 --start 2 --end 5 \
//!     --top-left 12,8 --top-right 620,0 --bottom-left 4,470 --bottom-right 636,478
//! keyclip inspect --input talk.mp4
//! keyclip encoders --json
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use keyclip::cli::{commands, Cli, Commands};
use keyclip::config::AppConfig;
use keyclip::utils::logging::{self, LogFormat};

/// Main entry point for the Keyclip CLI application
fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    logging::init(&cli.log_level, format);

    let config = AppConfig::load();
    info!("configuration loaded");

    match cli.command {
        Commands::Clip(args) => commands::clip(args, &config),
        Commands::Inspect(args) => commands::inspect(args, &config),
        Commands::Encoders(args) => commands::encoders(args, &config),
    }
}
