//! Transcode engine: job state machine, progress reporting, and the
//! background worker

pub mod orchestrator;
pub mod progress;
pub mod worker;

use std::fmt;

use serde::{Deserialize, Serialize};

/// States of a job's lifecycle.
///
/// `Failed` is reachable from any non-terminal state; `CorrectingGeometry`
/// only occurs when corner correction was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobPhase {
    Idle,
    Validating,
    Extracting,
    CorrectingGeometry,
    Encoding,
    MuxingAudio,
    Done,
    Failed,
}

impl JobPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Done | JobPhase::Failed)
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobPhase::Idle => "idle",
            JobPhase::Validating => "validating",
            JobPhase::Extracting => "extracting",
            JobPhase::CorrectingGeometry => "correcting geometry",
            JobPhase::Encoding => "encoding",
            JobPhase::MuxingAudio => "muxing audio",
            JobPhase::Done => "done",
            JobPhase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}
