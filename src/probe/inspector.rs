//! ffprobe-based source inspection
//!
//! The only place raw collaborator output is parsed; everything downstream
//! of this module works with typed [`VideoInfo`].

use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tracing::debug;

use crate::domain::model::VideoInfo;
use crate::error::{KeyclipError, KeyclipResult};
use crate::utils::process::{collaborator_command, stderr_excerpt};

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    nb_read_packets: Option<String>,
}

/// Reads source properties through the ffprobe collaborator
pub struct SourceInspector {
    ffprobe: String,
}

impl SourceInspector {
    pub fn new(ffprobe: impl Into<String>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
        }
    }

    /// Probe a source file.
    ///
    /// Any failure to run ffprobe, parse its JSON, or find a video stream is
    /// reported as `SourceUnreadable`.
    pub fn inspect(&self, path: &Path) -> KeyclipResult<VideoInfo> {
        let unreadable = |message: String| KeyclipError::SourceUnreadable {
            path: path.display().to_string(),
            message,
        };

        if !path.exists() {
            return Err(unreadable("no such file".into()));
        }

        let output = collaborator_command(&self.ffprobe)
            .args(["-v", "error", "-of", "json", "-show_streams", "-count_packets"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| unreadable(format!("failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(unreadable(format!(
                "ffprobe exited with {}: {}",
                output.status,
                stderr_excerpt(&output.stderr, 3)
            )));
        }

        let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| unreadable(format!("unparseable ffprobe output: {}", e)))?;

        let video = parsed
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| unreadable("no video stream".into()))?;
        let has_audio = parsed
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio"));

        let width = video.width.ok_or_else(|| unreadable("missing width".into()))?;
        let height = video
            .height
            .ok_or_else(|| unreadable("missing height".into()))?;
        let frame_rate = video
            .avg_frame_rate
            .as_deref()
            .map(parse_frame_rate)
            .transpose()
            .map_err(|m| unreadable(m))?
            .unwrap_or(0.0);
        let frame_count = video
            .nb_read_packets
            .as_deref()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        let info = VideoInfo {
            width,
            height,
            frame_rate,
            frame_count,
            has_audio,
        };
        debug!(?path, width, height, frame_rate, frame_count, has_audio, "probed source");
        Ok(info)
    }
}

/// Parse ffprobe's `num/den` frame rate form; `0/0` (images, some streams)
/// maps to 0.
fn parse_frame_rate(raw: &str) -> Result<f64, String> {
    let mut it = raw.split('/');
    let (Some(num), Some(den), None) = (it.next(), it.next(), it.next()) else {
        return Err(format!("unexpected avg_frame_rate '{}'", raw));
    };
    let num: f64 = num
        .parse()
        .map_err(|_| format!("bad frame rate numerator in '{}'", raw))?;
    let den: f64 = den
        .parse()
        .map_err(|_| format!("bad frame rate denominator in '{}'", raw))?;
    if den == 0.0 {
        return Ok(0.0);
    }
    Ok(num / den)
}
