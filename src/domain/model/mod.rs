// Domain models - Core types and data structures

#[cfg(test)]
mod tests;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{KeyclipError, KeyclipResult};

/// Time specification in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Convert to Duration
    pub fn to_duration(&self) -> Duration {
        Duration::from_secs_f64(self.seconds.max(0.0))
    }

    /// Parse a time string.
    ///
    /// Accepted formats: plain seconds (`12.5`), `MM:SS[.ms]`, `HH:MM:SS[.ms]`.
    pub fn parse(time_str: &str) -> KeyclipResult<Self> {
        let trimmed = time_str.trim();

        if let Ok(seconds) = trimmed.parse::<f64>() {
            if seconds < 0.0 {
                return Err(bad_time(trimmed, "time cannot be negative"));
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        match parts.len() {
            2 => {
                let minutes: u32 = parts[0]
                    .parse()
                    .map_err(|_| bad_time(trimmed, "invalid minutes"))?;
                let seconds: f64 = parts[1]
                    .parse()
                    .map_err(|_| bad_time(trimmed, "invalid seconds"))?;
                if !(0.0..60.0).contains(&seconds) {
                    return Err(bad_time(trimmed, "seconds must be in 0..60"));
                }
                Ok(Self::from_seconds(f64::from(minutes) * 60.0 + seconds))
            }
            3 => {
                let hours: u32 = parts[0]
                    .parse()
                    .map_err(|_| bad_time(trimmed, "invalid hours"))?;
                let minutes: u32 = parts[1]
                    .parse()
                    .map_err(|_| bad_time(trimmed, "invalid minutes"))?;
                let seconds: f64 = parts[2]
                    .parse()
                    .map_err(|_| bad_time(trimmed, "invalid seconds"))?;
                if minutes >= 60 {
                    return Err(bad_time(trimmed, "minutes must be in 0..60"));
                }
                if !(0.0..60.0).contains(&seconds) {
                    return Err(bad_time(trimmed, "seconds must be in 0..60"));
                }
                Ok(Self::from_seconds(
                    f64::from(hours) * 3600.0 + f64::from(minutes) * 60.0 + seconds,
                ))
            }
            _ => Err(bad_time(
                trimmed,
                "expected seconds, MM:SS.ms, or HH:MM:SS.ms",
            )),
        }
    }

    /// Format as `HH:MM:SS.ms` (hours omitted when zero)
    pub fn format_hms(&self) -> String {
        let total = self.seconds.max(0.0);
        let hours = (total / 3600.0) as u32;
        let minutes = ((total % 3600.0) / 60.0) as u32;
        let seconds = (total % 60.0) as u32;
        let millis = ((total % 1.0) * 1000.0) as u32;
        if hours > 0 {
            format!("{}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
        } else {
            format!("{}:{:02}.{:03}", minutes, seconds, millis)
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

fn bad_time(input: &str, reason: &str) -> KeyclipError {
    KeyclipError::InputValidation {
        message: format!("bad time '{}': {}", input, reason),
    }
}

/// Half-open time window `[start, end)` over a source, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    start: f64,
    end: f64,
}

impl TimeRange {
    /// Build a range, rejecting inverted or negative bounds.
    ///
    /// The upper bound against the source duration is checked separately by
    /// [`crate::domain::rules::JobValidator`] once the source has been probed.
    pub fn new(start: TimeSpec, end: TimeSpec) -> KeyclipResult<Self> {
        if start.seconds < 0.0 || end.seconds < 0.0 {
            return Err(KeyclipError::InputValidation {
                message: "time range bounds must be non-negative".into(),
            });
        }
        if start.seconds >= end.seconds {
            return Err(KeyclipError::InputValidation {
                message: format!(
                    "start ({}) must be before end ({})",
                    start.format_hms(),
                    end.format_hms()
                ),
            });
        }
        Ok(Self {
            start: start.seconds,
            end: end.seconds,
        })
    }

    pub fn start_seconds(&self) -> f64 {
        self.start
    }

    pub fn end_seconds(&self) -> f64 {
        self.end
    }

    /// Window length in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.end - self.start
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            TimeSpec::from_seconds(self.start).format_hms(),
            TimeSpec::from_seconds(self.end).format_hms()
        )
    }
}

/// A 2D point in source-frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::str::FromStr for Point {
    type Err = KeyclipError;

    /// Parse `x,y`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut it = s.split(',');
        let (Some(xs), Some(ys), None) = (it.next(), it.next(), it.next()) else {
            return Err(KeyclipError::InputValidation {
                message: format!("bad point '{}': expected x,y", s),
            });
        };
        let parse = |v: &str| -> KeyclipResult<f64> {
            v.trim().parse().map_err(|_| KeyclipError::InputValidation {
                message: format!("bad point '{}': coordinates must be numbers", s),
            })
        };
        Ok(Point::new(parse(xs)?, parse(ys)?))
    }
}

/// Ordered corner points of the region to un-skew: top-left, top-right,
/// bottom-left, bottom-right, in source-frame pixel coordinates.
///
/// Coordinates may fall outside the frame bounds; extrapolation is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadPoints {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl QuadPoints {
    pub fn new(top_left: Point, top_right: Point, bottom_left: Point, bottom_right: Point) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// The frame's own four corners, the default when correction is enabled
    /// without explicit points.
    pub fn frame_corners(width: u32, height: u32) -> Self {
        let (w, h) = (f64::from(width), f64::from(height));
        Self::new(
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(0.0, h),
            Point::new(w, h),
        )
    }

    /// Corner points in TL, TR, BL, BR order
    pub fn as_array(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }

    /// Reject quads where any three corners are collinear (which includes
    /// repeated corners and the all-identical case).
    pub fn degenerate_reason(&self) -> Option<String> {
        const LABELS: [&str; 4] = ["top-left", "top-right", "bottom-left", "bottom-right"];
        let pts = self.as_array();
        for skip in 0..4 {
            let tri: Vec<Point> = (0..4).filter(|i| *i != skip).map(|i| pts[i]).collect();
            let area = (tri[1].x - tri[0].x) * (tri[2].y - tri[0].y)
                - (tri[2].x - tri[0].x) * (tri[1].y - tri[0].y);
            if area.abs() < 1e-6 {
                return Some(format!(
                    "corners excluding {} are collinear",
                    LABELS[skip]
                ));
            }
        }
        None
    }
}

/// Source video properties, read once when the source is opened and
/// immutable for the rest of the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub frame_count: u64,
    pub has_audio: bool,
}

impl VideoInfo {
    /// Total duration in seconds, derived from the frame count
    pub fn duration_seconds(&self) -> f64 {
        if self.frame_rate > 0.0 {
            self.frame_count as f64 / self.frame_rate
        } else {
            0.0
        }
    }
}

/// Requested output quality level; each encoder family maps these onto its
/// own fixed parameter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityProfile {
    Highest,
    High,
    Standard,
    Fast,
}

impl QualityProfile {
    pub fn parse(s: &str) -> KeyclipResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "highest" => Ok(Self::Highest),
            "high" => Ok(Self::High),
            "standard" => Ok(Self::Standard),
            "fast" => Ok(Self::Fast),
            other => Err(KeyclipError::InputValidation {
                message: format!(
                    "unknown quality '{}': expected highest, high, standard, or fast",
                    other
                ),
            }),
        }
    }
}

impl fmt::Display for QualityProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Highest => "highest",
            Self::High => "high",
            Self::Standard => "standard",
            Self::Fast => "fast",
        };
        write!(f, "{}", name)
    }
}

/// Keystone correction request carried by a job
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CorrectionMode {
    /// No correction; the single-pass path applies
    Disabled,
    /// Correct with the frame's own corners (the default when correction is
    /// enabled without explicit points)
    FrameCorners,
    /// Correct with user-supplied corner points
    Quad(QuadPoints),
}

impl CorrectionMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, CorrectionMode::Disabled)
    }
}

/// Immutable job configuration, constructed once before the worker starts.
///
/// The worker never reads externally mutable state mid-run; everything it
/// needs is captured here.
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Source video path
    pub input: PathBuf,
    /// Output video path (mp4 container)
    pub output: PathBuf,
    /// Trim window
    pub range: TimeRange,
    /// Keystone correction request
    pub correction: CorrectionMode,
    /// Quality level for the encoder parameter tables
    pub quality: QualityProfile,
    /// Optional quantizer override (0-51, CRF scale)
    pub crf_override: Option<u8>,
    /// Backend id requested by the user; `None` selects the top-ranked probe result
    pub requested_encoder: Option<String>,
    /// Replace an existing output file instead of refusing
    pub overwrite: bool,
}

/// Terminal success report for a finished job
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub output_path: PathBuf,
    /// Display name of the encoder that actually produced the output
    /// (reflects the fallback when the first choice failed)
    pub encoder_name: String,
    /// Frames that went through the frame pipeline; `None` for the
    /// single-pass path where the encoder consumes the source directly
    pub frames_processed: Option<u64>,
    pub elapsed: Duration,
}
