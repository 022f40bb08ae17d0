//! Progress reporting from the worker to the interactive surface
//!
//! All progress crosses the worker boundary as posted updates; the worker
//! never shares mutable state with the surface directly.

use std::sync::mpsc::Sender;
use std::sync::Mutex;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::domain::model::TimeSpec;

/// Frames per progress report during the frame loop
pub const PROGRESS_BATCH_FRAMES: u64 = 30;

/// One progress report: overall percent and a human-readable message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub percent: f32,
    pub message: String,
}

/// Receives progress updates from the worker.
///
/// Implementations must tolerate being invoked from a non-interactive
/// execution context, and must never fail the job.
pub trait ProgressSink: Send + Sync {
    fn update(&self, percent: f32, message: &str);
}

/// Posts updates over an mpsc channel to the interactive surface.
///
/// A gone receiver is ignored: a job finishes (or fails) on its own merits
/// even when nobody is listening anymore.
pub struct ChannelSink {
    tx: Mutex<Sender<ProgressUpdate>>,
}

impl ChannelSink {
    pub fn new(tx: Sender<ProgressUpdate>) -> Self {
        Self { tx: Mutex::new(tx) }
    }
}

impl ProgressSink for ChannelSink {
    fn update(&self, percent: f32, message: &str) {
        if let Ok(tx) = self.tx.lock() {
            let _ = tx.send(ProgressUpdate {
                percent,
                message: message.to_string(),
            });
        }
    }
}

/// Discards all updates; used where nothing is listening
pub struct NullSink;

impl ProgressSink for NullSink {
    fn update(&self, _percent: f32, _message: &str) {}
}

/// Batched progress emitter for the frame loop.
///
/// Emits after every [`PROGRESS_BATCH_FRAMES`] frames with the completed
/// share of `scale` percent and a remaining-time estimate of
/// `elapsed / done * remaining`.
pub struct FrameMeter<'a> {
    sink: &'a dyn ProgressSink,
    label: &'a str,
    total_frames: u64,
    scale: f32,
    started: Instant,
    done: u64,
}

impl<'a> FrameMeter<'a> {
    pub fn new(sink: &'a dyn ProgressSink, label: &'a str, total_frames: u64, scale: f32) -> Self {
        Self {
            sink,
            label,
            total_frames,
            scale,
            started: Instant::now(),
            done: 0,
        }
    }

    /// Record one processed frame, reporting on batch boundaries.
    pub fn tick(&mut self) {
        self.done += 1;
        if self.done % PROGRESS_BATCH_FRAMES != 0 && self.done != self.total_frames {
            return;
        }
        self.emit();
    }

    fn emit(&self) {
        if self.total_frames == 0 {
            return;
        }
        let fraction = self.done as f64 / self.total_frames as f64;
        let percent = (fraction * f64::from(self.scale)) as f32;
        let elapsed = self.started.elapsed().as_secs_f64();
        let message = if self.done > 0 && self.done < self.total_frames {
            let remaining = elapsed / self.done as f64 * (self.total_frames - self.done) as f64;
            format!(
                "{} frame {}/{} (about {} left)",
                self.label,
                self.done,
                self.total_frames,
                TimeSpec::from_seconds(remaining).format_hms()
            )
        } else {
            format!("{} frame {}/{}", self.label, self.done, self.total_frames)
        };
        self.sink.update(percent, &message);
    }

    pub fn frames_done(&self) -> u64 {
        self.done
    }
}
