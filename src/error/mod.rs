//! Error handling module for Keyclip

use thiserror::Error;

/// Main error type for Keyclip operations
#[derive(Error, Debug)]
pub enum KeyclipError {
    /// Bad time range, bad arguments, or an output conflict caught before any work starts
    #[error("Invalid input: {message}")]
    InputValidation { message: String },

    /// Source file could not be opened or probed
    #[error("Source is not readable: {path}: {message}")]
    SourceUnreadable { path: String, message: String },

    /// Decode failure after processing already started
    #[error("Source read failed mid-stream: {message}")]
    SourceRead { message: String },

    /// The four corner points do not span a valid quadrilateral
    #[error("Degenerate corner geometry: {message}")]
    DegenerateGeometry { message: String },

    /// Encoder backend failed to start or returned a non-zero exit
    #[error("Encoder '{backend}' failed: {message}")]
    EncodeFailed { backend: String, message: String },

    /// Combining the video stream with the original audio failed
    #[error("Audio mux failed: {message}")]
    MuxFailed { message: String },

    /// Encoder probing could not run at all
    #[error("Encoder probe failed: {message}")]
    ProbeFailed { message: String },

    /// Only one job may run per application instance
    #[error("A job is already running")]
    JobAlreadyRunning,

    /// Unexpected fault caught at the job boundary (e.g. a worker panic)
    #[error("Internal failure: {message}")]
    Internal { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KeyclipError {
    /// Stable taxonomy code reported alongside terminal failures.
    ///
    /// Unreadable sources and degenerate geometry are surfaced before any
    /// processing starts, so they share the input-validation code.
    pub fn code(&self) -> &'static str {
        match self {
            KeyclipError::InputValidation { .. }
            | KeyclipError::SourceUnreadable { .. }
            | KeyclipError::DegenerateGeometry { .. } => "input-validation",
            KeyclipError::SourceRead { .. } => "source-read",
            KeyclipError::EncodeFailed { .. } => "encode-failed",
            KeyclipError::MuxFailed { .. } => "mux-failed",
            KeyclipError::ProbeFailed { .. } => "probe-failed",
            KeyclipError::JobAlreadyRunning => "job-busy",
            KeyclipError::Internal { .. } => "internal",
            KeyclipError::Io(_) => "io",
        }
    }

    /// Single user-visible message for the job boundary.
    pub fn user_message(&self) -> String {
        format!("[{}] {}", self.code(), self)
    }
}

/// Result type alias for Keyclip operations
pub type KeyclipResult<T> = std::result::Result<T, KeyclipError>;
