//! Keyclip library
//!
//! Trims a video to a time range and optionally applies a four-point
//! keystone (perspective) correction to every frame before re-encoding,
//! with probing and graceful fallback across hardware and software encoder
//! backends. Audio is always copied verbatim from the original source.
//!
//! The graphical point editor and any widget layer live outside this crate;
//! the library exposes a narrow surface for them: an immutable [`domain::model::JobConfig`],
//! a [`engine::progress::ProgressSink`] for asynchronous progress delivery,
//! and the structured [`encoder::probe::ProbeReport`] for diagnostics.

pub mod cli;
pub mod config;
pub mod domain;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod frames;
pub mod geometry;
pub mod probe;
pub mod streams;
pub mod utils;

// Re-export commonly used types
pub use config::{AppConfig, ToolPaths};
pub use domain::model::{
    CorrectionMode, JobConfig, JobOutcome, Point, QuadPoints, QualityProfile, TimeRange, TimeSpec,
    VideoInfo,
};
pub use encoder::{BackendFamily, EncoderDescriptor};
pub use engine::orchestrator::Orchestrator;
pub use engine::progress::{ChannelSink, ProgressSink, ProgressUpdate};
pub use engine::worker::JobRunner;
pub use error::{KeyclipError, KeyclipResult};
