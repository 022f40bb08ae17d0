//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

fn crf_in_range(s: &str) -> Result<u8, String> {
    clap_num::number_range(s, 0, 51)
}

/// Arguments for the clip command
#[derive(Args, Debug)]
pub struct ClipArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Start time (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub start: String,

    /// End time (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub end: String,

    /// Output file path (default: next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Quality level (highest, high, standard, fast)
    #[arg(long)]
    pub quality: Option<String>,

    /// Encoder backend id (e.g. h264_nvenc, libx264); default: best probed
    #[arg(long)]
    pub encoder: Option<String>,

    /// Quantizer override on the CRF scale (0-51)
    #[arg(long, value_parser = crf_in_range)]
    pub crf: Option<u8>,

    /// Enable keystone correction with the frame's own corners
    #[arg(long)]
    pub keystone: bool,

    /// Top-left corner as x,y in source pixels (needs all four corners)
    #[arg(long, value_name = "X,Y")]
    pub top_left: Option<String>,

    /// Top-right corner as x,y in source pixels
    #[arg(long, value_name = "X,Y")]
    pub top_right: Option<String>,

    /// Bottom-left corner as x,y in source pixels
    #[arg(long, value_name = "X,Y")]
    pub bottom_left: Option<String>,

    /// Bottom-right corner as x,y in source pixels
    #[arg(long, value_name = "X,Y")]
    pub bottom_right: Option<String>,

    /// Replace the output file if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the encoders command
#[derive(Args, Debug)]
pub struct EncodersArgs {
    /// Output the full probe report in JSON format
    #[arg(long)]
    pub json: bool,
}
