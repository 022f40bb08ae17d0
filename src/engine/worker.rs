//! Background worker for job execution
//!
//! One job runs end-to-end on a single worker thread while the interactive
//! surface stays responsive. Only one job may run per application instance;
//! cancellation is not supported — a started job runs to completion or
//! failure.

use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::info;

use super::orchestrator::Orchestrator;
use super::progress::ProgressSink;
use crate::domain::model::JobOutcome;
use crate::error::{KeyclipError, KeyclipResult};

/// Single-flight runner for background jobs
pub struct JobRunner {
    handle: Option<JoinHandle<KeyclipResult<JobOutcome>>>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Start a job on a background thread. Fails with `JobAlreadyRunning`
    /// while a previous job is still going.
    pub fn try_start(
        &mut self,
        orchestrator: Orchestrator,
        sink: Arc<dyn ProgressSink>,
    ) -> KeyclipResult<()> {
        self.try_start_with(move || orchestrator.run(sink.as_ref()))
    }

    /// Test seam: run an arbitrary job body under the same single-flight
    /// policy.
    pub fn try_start_with<F>(&mut self, body: F) -> KeyclipResult<()>
    where
        F: FnOnce() -> KeyclipResult<JobOutcome> + Send + 'static,
    {
        if self.is_running() {
            return Err(KeyclipError::JobAlreadyRunning);
        }
        // A finished handle may still be parked here; joining it below in
        // `join` is the only way to consume it, so refuse until then
        if self.handle.is_some() {
            return Err(KeyclipError::JobAlreadyRunning);
        }
        info!("starting background job");
        self.handle = Some(std::thread::spawn(body));
        Ok(())
    }

    /// Whether a worker thread is still executing
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Block until the current job finishes and return its outcome.
    ///
    /// A worker panic is normalized into the error taxonomy instead of
    /// propagating into the interactive surface.
    pub fn join(&mut self) -> Option<KeyclipResult<JobOutcome>> {
        self.handle.take().map(|handle| {
            handle.join().unwrap_or_else(|_| {
                Err(KeyclipError::Internal {
                    message: "worker thread panicked".into(),
                })
            })
        })
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
