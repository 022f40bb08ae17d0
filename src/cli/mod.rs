//! CLI module for Keyclip
//!
//! Handles command-line argument parsing and command execution.

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// Keyclip - trim videos with optional four-point keystone correction
///
/// Cuts a time range out of a video, optionally un-skews every frame with a
/// perspective correction derived from four corner points, and re-encodes
/// on the best available backend while copying the original audio.
#[derive(Parser)]
#[command(name = "keyclip")]
#[command(about = "Trim a video and optionally apply keystone correction")]
#[command(version)]
pub struct Cli {
    /// Logging level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Extract a time range from a video, optionally keystone-corrected
    Clip(args::ClipArgs),
    /// Inspect video file information
    Inspect(args::InspectArgs),
    /// Probe and rank the available encoder backends
    Encoders(args::EncodersArgs),
}
