//! Encoder collaborator invocations
//!
//! Three invocation shapes cover every job: a single-pass trim+encode, a
//! rawvideo pipe encode fed frame-by-frame, and a copy-only mux attaching
//! the original audio. Success is exit code 0; stderr is captured and
//! folded into the failure detail.

use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Stdio};

use tracing::{debug, info};

use super::{quality_args, BackendFamily, EncoderDescriptor};
use crate::domain::model::{QualityProfile, TimeRange};
use crate::error::{KeyclipError, KeyclipResult};
use crate::frames::FrameBuffer;
use crate::streams::MuxMapping;
use crate::utils::process::{collaborator_command, stderr_excerpt};

/// Thread count hint for container-level software encodes
fn software_threads() -> usize {
    num_cpus::get()
}

/// Arguments for the single-pass path: trim the source and encode in one
/// invocation, copying the audio stream verbatim.
///
/// `-ss`/`-t` follow the input, trading seek speed for frame accuracy.
pub fn trim_encode_args(
    input: &Path,
    output: &Path,
    range: &TimeRange,
    descriptor: &EncoderDescriptor,
    profile: QualityProfile,
    crf_override: Option<u8>,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-v".into(),
        "error".into(),
        "-nostdin".into(),
        "-i".into(),
        input.display().to_string(),
        "-ss".into(),
        format!("{:.6}", range.start_seconds()),
        "-t".into(),
        format!("{:.6}", range.duration_seconds()),
        "-c:v".into(),
        descriptor.backend_id.clone(),
    ];
    args.extend(quality_args(descriptor, profile, crf_override));
    if descriptor.family == BackendFamily::SoftwareContainer {
        args.push("-threads".into());
        args.push(software_threads().to_string());
    }
    args.extend(["-c:a".into(), "copy".into()]);
    args.extend(["-pix_fmt".into(), "yuv420p".into()]);
    args.push(output.display().to_string());
    args
}

/// Run the single-pass trim+encode.
pub fn trim_encode(
    ffmpeg: &str,
    input: &Path,
    output: &Path,
    range: &TimeRange,
    descriptor: &EncoderDescriptor,
    profile: QualityProfile,
    crf_override: Option<u8>,
) -> KeyclipResult<()> {
    let args = trim_encode_args(input, output, range, descriptor, profile, crf_override);
    info!(backend = %descriptor.backend_id, "starting single-pass encode");
    run_to_completion(ffmpeg, &args, |message| KeyclipError::EncodeFailed {
        backend: descriptor.backend_id.clone(),
        message,
    })
}

/// Arguments for the copy-only mux: input 0 is the corrected video-only
/// intermediate, input 1 the original source trimmed to the same window for
/// its audio.
pub fn mux_args(
    video_only: &Path,
    original: &Path,
    output: &Path,
    range: &TimeRange,
    mapping: MuxMapping,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-v".into(),
        "error".into(),
        "-nostdin".into(),
        "-i".into(),
        video_only.display().to_string(),
        "-ss".into(),
        format!("{:.6}", range.start_seconds()),
        "-t".into(),
        format!("{:.6}", range.duration_seconds()),
        "-i".into(),
        original.display().to_string(),
    ];
    args.extend(mapping.args());
    args.push(output.display().to_string());
    args
}

/// Combine the corrected video stream with the original audio.
pub fn mux(
    ffmpeg: &str,
    video_only: &Path,
    original: &Path,
    output: &Path,
    range: &TimeRange,
    mapping: MuxMapping,
) -> KeyclipResult<()> {
    let args = mux_args(video_only, original, output, range, mapping);
    info!("muxing corrected video with original audio");
    run_to_completion(ffmpeg, &args, |message| KeyclipError::MuxFailed { message })
}

fn run_to_completion(
    ffmpeg: &str,
    args: &[String],
    to_error: impl Fn(String) -> KeyclipError,
) -> KeyclipResult<()> {
    debug!(?args, "running collaborator");
    let output = collaborator_command(ffmpeg)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| to_error(format!("failed to start process: {}", e)))?;

    if !output.status.success() {
        return Err(to_error(format!(
            "exit {}: {}",
            output.status,
            stderr_excerpt(&output.stderr, 4)
        )));
    }
    Ok(())
}

/// Streaming encoder for the geometry path: rawvideo rgb24 frames written
/// to the collaborator's stdin, producing a video-only file.
///
/// Abandoning the encoder (drop without `finish`) kills the child process.
pub struct PipeEncoder {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    backend_id: String,
    width: u32,
    height: u32,
}

impl PipeEncoder {
    /// Spawn the encode process. The output carries no audio; the mux step
    /// attaches it afterwards.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        ffmpeg: &str,
        descriptor: &EncoderDescriptor,
        profile: QualityProfile,
        crf_override: Option<u8>,
        width: u32,
        height: u32,
        frame_rate: f64,
        output: &Path,
    ) -> KeyclipResult<Self> {
        let encode_failed = |message: String| KeyclipError::EncodeFailed {
            backend: descriptor.backend_id.clone(),
            message,
        };

        let mut cmd = collaborator_command(ffmpeg);
        cmd.args(["-y", "-v", "error"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s", &format!("{}x{}", width, height)])
            .args(["-r", &format!("{}", frame_rate)])
            .args(["-i", "pipe:0", "-an"])
            .args(["-c:v", &descriptor.backend_id])
            .args(quality_args(descriptor, profile, crf_override));
        if descriptor.family == BackendFamily::SoftwareContainer {
            cmd.args(["-threads", &software_threads().to_string()]);
        }
        cmd.args(["-pix_fmt", "yuv420p"])
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        info!(backend = %descriptor.backend_id, "starting frame-pipe encode");
        let mut child = cmd
            .spawn()
            .map_err(|e| encode_failed(format!("failed to start process: {}", e)))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| encode_failed("encoder stdin unavailable".into()))?;

        Ok(Self {
            child: Some(child),
            stdin: Some(stdin),
            backend_id: descriptor.backend_id.clone(),
            width,
            height,
        })
    }

    /// Write one frame; sizes must match the spawn dimensions.
    pub fn write_frame(&mut self, frame: &FrameBuffer) -> KeyclipResult<()> {
        if frame.width != self.width || frame.height != self.height {
            return Err(KeyclipError::EncodeFailed {
                backend: self.backend_id.clone(),
                message: format!(
                    "frame size {}x{} does not match encoder {}x{}",
                    frame.width, frame.height, self.width, self.height
                ),
            });
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(KeyclipError::EncodeFailed {
                backend: self.backend_id.clone(),
                message: "encoder already finished".into(),
            });
        };
        stdin.write_all(&frame.data).map_err(|e| {
            // A broken pipe here means the encoder process died early
            KeyclipError::EncodeFailed {
                backend: self.backend_id.clone(),
                message: format!("write to encoder failed: {}", e),
            }
        })
    }

    /// Close stdin and wait for the encoder to exit.
    pub fn finish(mut self) -> KeyclipResult<()> {
        drop(self.stdin.take());
        let child = self.child.take().ok_or_else(|| KeyclipError::EncodeFailed {
            backend: self.backend_id.clone(),
            message: "encoder already finished".into(),
        })?;
        let output = child.wait_with_output().map_err(|e| {
            KeyclipError::EncodeFailed {
                backend: self.backend_id.clone(),
                message: format!("failed to wait for encoder: {}", e),
            }
        })?;
        if !output.status.success() {
            return Err(KeyclipError::EncodeFailed {
                backend: self.backend_id.clone(),
                message: format!(
                    "exit {}: {}",
                    output.status,
                    stderr_excerpt(&output.stderr, 4)
                ),
            });
        }
        Ok(())
    }
}

impl Drop for PipeEncoder {
    fn drop(&mut self) {
        // Only reached when the encode was abandoned mid-stream
        if let Some(mut child) = self.child.take() {
            drop(self.stdin.take());
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
