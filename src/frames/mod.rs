//! Frame extraction: time window to frame indices, and a lazy rawvideo
//! frame stream decoded by the ffmpeg collaborator process.

use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdout, Stdio};

use tracing::{debug, warn};

use crate::domain::model::{TimeRange, VideoInfo};
use crate::error::{KeyclipError, KeyclipResult};
use crate::utils::process::collaborator_command;

/// Bytes per pixel of the rawvideo interchange format (rgb24)
pub const BYTES_PER_PIXEL: usize = 3;

/// A single decoded frame, tightly packed rgb24, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameBuffer {
    /// All-black frame of the given size
    pub fn black(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let o = self.offset(x, y);
        [self.data[o], self.data[o + 1], self.data[o + 2]]
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let o = self.offset(x, y);
        self.data[o..o + 3].copy_from_slice(&rgb);
    }

    /// Byte length of one frame at the given dimensions
    pub fn frame_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }
}

/// Frame index window `[start_frame, end_frame)` derived from a time range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameWindow {
    pub start_frame: u64,
    pub end_frame: u64,
}

impl FrameWindow {
    /// Index bounds are `round(t * fps)` at both ends.
    pub fn from_range(range: &TimeRange, frame_rate: f64) -> Self {
        let start_frame = (range.start_seconds() * frame_rate).round() as u64;
        let end_frame = (range.end_seconds() * frame_rate).round() as u64;
        Self {
            start_frame,
            end_frame: end_frame.max(start_frame),
        }
    }

    /// Number of frames the window selects
    pub fn frame_count(&self) -> u64 {
        self.end_frame - self.start_frame
    }

    /// Seek position of the first frame, in seconds
    pub fn start_seconds(&self, frame_rate: f64) -> f64 {
        if frame_rate > 0.0 {
            self.start_frame as f64 / frame_rate
        } else {
            0.0
        }
    }
}

/// Lazy, finite, forward-only frame stream over a window of the source.
///
/// Decoding runs in an ffmpeg child process emitting rgb24 rawvideo on
/// stdout; one `read_exact` per frame. The stream stops after the window's
/// frame budget or on source exhaustion, whichever comes first, and is not
/// restartable; rewinding takes a fresh `open`.
pub struct FrameSource {
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
    budget: u64,
    produced: u64,
}

impl FrameSource {
    /// Spawn the decode process positioned at the window start.
    pub fn open(
        ffmpeg: &str,
        path: &Path,
        info: &VideoInfo,
        window: FrameWindow,
    ) -> KeyclipResult<Self> {
        let seek = window.start_seconds(info.frame_rate);
        let mut cmd = collaborator_command(ffmpeg);
        cmd.args(["-v", "error", "-nostdin"])
            .args(["-ss", &format!("{:.6}", seek)])
            .arg("-i")
            .arg(path)
            .args(["-frames:v", &window.frame_count().to_string()])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        debug!(?path, start_frame = window.start_frame, frames = window.frame_count(), "spawning decode process");

        let mut child = cmd.spawn().map_err(|e| KeyclipError::SourceUnreadable {
            path: path.display().to_string(),
            message: format!("failed to start decoder: {}", e),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| KeyclipError::SourceUnreadable {
            path: path.display().to_string(),
            message: "decoder stdout unavailable".into(),
        })?;

        Ok(Self {
            child,
            stdout,
            width: info.width,
            height: info.height,
            budget: window.frame_count(),
            produced: 0,
        })
    }

    /// Next frame in the window; `None` once the budget is spent or the
    /// source ran out early (a truncated source is not an error).
    pub fn next_frame(&mut self) -> KeyclipResult<Option<FrameBuffer>> {
        if self.produced >= self.budget {
            return Ok(None);
        }

        let frame_len = FrameBuffer::frame_len(self.width, self.height);
        let mut data = vec![0u8; frame_len];
        let mut filled = 0usize;
        while filled < frame_len {
            match self.stdout.read(&mut data[filled..]) {
                Ok(0) => {
                    if filled == 0 {
                        // Clean end of stream between frames
                        if self.produced < self.budget {
                            warn!(
                                produced = self.produced,
                                expected = self.budget,
                                "source exhausted before the requested window"
                            );
                        }
                        return Ok(None);
                    }
                    // A torn frame is a decode failure, not exhaustion
                    return Err(KeyclipError::SourceRead {
                        message: format!(
                            "decoder stopped mid-frame after {} of {} bytes (frame {})",
                            filled, frame_len, self.produced
                        ),
                    });
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(KeyclipError::SourceRead {
                        message: format!("read from decoder failed: {}", e),
                    })
                }
            }
        }

        self.produced += 1;
        Ok(Some(FrameBuffer {
            width: self.width,
            height: self.height,
            data,
        }))
    }

    /// Frames handed out so far
    pub fn frames_produced(&self) -> u64 {
        self.produced
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        // The child may still be running if the stream was abandoned early
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
