//! Top-level job state machine
//!
//! Sequences validation, frame extraction, optional geometry correction,
//! encoding, and audio muxing. All failures are normalized to the crate's
//! error taxonomy at this boundary, and intermediate artifacts are removed
//! on every exit path.

use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};

use super::progress::{FrameMeter, ProgressSink};
use super::JobPhase;
use crate::config::ToolPaths;
use crate::domain::model::{CorrectionMode, JobConfig, JobOutcome, VideoInfo};
use crate::domain::rules::{default_quad, JobValidator};
use crate::encoder::{invoke, select_encoder, EncoderDescriptor};
use crate::error::{KeyclipError, KeyclipResult};
use crate::frames::{FrameSource, FrameWindow};
use crate::geometry::{warp, PerspectiveTransform};
use crate::probe::SourceInspector;
use crate::streams::MuxMapping;
use crate::utils::path::ensure_parent_dir;

/// Everything the execution phases need, assembled during validation.
///
/// The perspective transform is derived here exactly once per job and
/// reused for every frame.
#[derive(Debug)]
pub struct JobPlan {
    pub info: VideoInfo,
    pub window: FrameWindow,
    pub transform: Option<PerspectiveTransform>,
    pub encoder: EncoderDescriptor,
    pub fallback: EncoderDescriptor,
    pub mapping: MuxMapping,
}

impl JobPlan {
    /// Validate the job and assemble the plan. Nothing has been extracted
    /// or encoded when this fails; violations are terminal input errors.
    pub fn prepare(
        config: &JobConfig,
        tools: &ToolPaths,
        ranked: &[EncoderDescriptor],
    ) -> KeyclipResult<Self> {
        JobValidator::validate_geometry(config)?;
        JobValidator::validate_output(config)?;

        let inspector = SourceInspector::new(tools.ffprobe.as_str());
        let info = inspector.inspect(&config.input)?;
        JobValidator::validate_against_source(config, &info)?;

        let window = FrameWindow::from_range(&config.range, info.frame_rate);
        if config.correction.is_enabled() && window.frame_count() == 0 {
            return Err(KeyclipError::InputValidation {
                message: "time range selects no frames".into(),
            });
        }

        let quad = match config.correction {
            CorrectionMode::Disabled => None,
            CorrectionMode::FrameCorners => Some(default_quad(&info)),
            CorrectionMode::Quad(quad) => Some(quad),
        };
        let transform = quad
            .map(|quad| PerspectiveTransform::from_quad(&quad, info.width, info.height))
            .transpose()?;

        let encoder = select_encoder(ranked, config.requested_encoder.as_deref())
            .cloned()
            .ok_or_else(|| KeyclipError::InputValidation {
                message: match &config.requested_encoder {
                    Some(id) => format!("requested encoder '{}' is not available", id),
                    None => "no encoder backends available".into(),
                },
            })?;

        Ok(Self {
            mapping: MuxMapping::new(info.has_audio),
            info,
            window,
            transform,
            encoder,
            fallback: EncoderDescriptor::fallback(),
        })
    }
}

/// Drives one job from validation to a terminal state.
pub struct Orchestrator {
    config: JobConfig,
    tools: ToolPaths,
    ranked: Vec<EncoderDescriptor>,
}

impl Orchestrator {
    pub fn new(config: JobConfig, tools: ToolPaths, ranked: Vec<EncoderDescriptor>) -> Self {
        Self {
            config,
            tools,
            ranked,
        }
    }

    /// Run the job to completion or failure.
    ///
    /// On failure any partially written output is removed, so no partial
    /// artifacts outlive the job.
    pub fn run(&self, sink: &dyn ProgressSink) -> KeyclipResult<JobOutcome> {
        let started = Instant::now();
        let result = self.run_phases(sink, started);
        if result.is_err() {
            remove_artifact(&self.config.output);
        }
        result
    }

    fn run_phases(&self, sink: &dyn ProgressSink, started: Instant) -> KeyclipResult<JobOutcome> {
        sink.update(0.0, &JobPhase::Validating.to_string());
        let plan = JobPlan::prepare(&self.config, &self.tools, &self.ranked)?;
        info!(
            encoder = %plan.encoder.backend_id,
            frames = plan.window.frame_count(),
            corrected = plan.transform.is_some(),
            "job plan ready"
        );

        let (encoder_name, frames_processed) = if plan.transform.is_some() {
            self.run_with_fallback(&plan, sink, |descriptor| {
                self.corrected_pass(&plan, descriptor, sink)
            })?
        } else {
            self.run_with_fallback(&plan, sink, |descriptor| {
                self.direct_pass(descriptor, sink)
            })?
        };

        sink.update(100.0, &JobPhase::Done.to_string());
        Ok(JobOutcome {
            output_path: self.config.output.clone(),
            encoder_name,
            frames_processed,
            elapsed: started.elapsed(),
        })
    }

    /// Execute a pass with the planned encoder, retrying exactly once with
    /// the guaranteed fallback when the encoder itself fails.
    fn run_with_fallback<F>(
        &self,
        plan: &JobPlan,
        sink: &dyn ProgressSink,
        pass: F,
    ) -> KeyclipResult<(String, Option<u64>)>
    where
        F: Fn(&EncoderDescriptor) -> KeyclipResult<Option<u64>>,
    {
        match pass(&plan.encoder) {
            Ok(frames) => Ok((plan.encoder.display_name.clone(), frames)),
            Err(KeyclipError::EncodeFailed { backend, message })
                if plan.encoder.backend_id != plan.fallback.backend_id =>
            {
                warn!(%backend, %message, "encode failed; retrying with fallback backend");
                sink.update(
                    0.0,
                    &format!("{} failed, retrying with {}", backend, plan.fallback.display_name),
                );
                let frames = pass(&plan.fallback)?;
                Ok((plan.fallback.display_name.clone(), frames))
            }
            Err(other) => Err(other),
        }
    }

    /// Single-pass path: the encoder consumes the source range directly and
    /// the audio stream is copied in the same invocation.
    fn direct_pass(
        &self,
        descriptor: &EncoderDescriptor,
        sink: &dyn ProgressSink,
    ) -> KeyclipResult<Option<u64>> {
        sink.update(5.0, &JobPhase::Encoding.to_string());
        ensure_parent_dir(&self.config.output)?;
        invoke::trim_encode(
            &self.tools.ffmpeg,
            &self.config.input,
            &self.config.output,
            &self.config.range,
            descriptor,
            self.config.quality,
            self.config.crf_override,
        )?;
        Ok(None)
    }

    /// Two-phase geometry path: corrected frames are always materialized
    /// into a video-only intermediate before the final mux, and the
    /// intermediate is deleted on success and failure alike.
    fn corrected_pass(
        &self,
        plan: &JobPlan,
        descriptor: &EncoderDescriptor,
        sink: &dyn ProgressSink,
    ) -> KeyclipResult<Option<u64>> {
        let transform = plan.transform.as_ref().ok_or_else(|| KeyclipError::Internal {
            message: "corrected pass reached without a transform".into(),
        })?;

        ensure_parent_dir(&self.config.output)?;
        let scratch_dir = self
            .config
            .output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| std::env::temp_dir());
        // Owns the intermediate artifact; dropping it removes the file on
        // every exit path out of this function
        let intermediate = tempfile::Builder::new()
            .prefix(".keyclip-")
            .suffix(".mp4")
            .tempfile_in(scratch_dir)
            .map_err(KeyclipError::Io)?;

        sink.update(0.0, &JobPhase::Extracting.to_string());
        let mut source = FrameSource::open(
            &self.tools.ffmpeg,
            &self.config.input,
            &plan.info,
            plan.window,
        )?;
        let mut encoder = invoke::PipeEncoder::spawn(
            &self.tools.ffmpeg,
            descriptor,
            self.config.quality,
            self.config.crf_override,
            plan.info.width,
            plan.info.height,
            plan.info.frame_rate,
            intermediate.path(),
        )?;

        let label = JobPhase::CorrectingGeometry.to_string();
        let mut meter = FrameMeter::new(sink, &label, plan.window.frame_count(), 90.0);
        while let Some(frame) = source.next_frame()? {
            let corrected = warp::warp_frame(transform, &frame);
            encoder.write_frame(&corrected)?;
            meter.tick();
        }
        let frames = source.frames_produced();
        drop(source);
        encoder.finish()?;
        info!(frames, "corrected intermediate written");

        sink.update(90.0, &JobPhase::MuxingAudio.to_string());
        invoke::mux(
            &self.tools.ffmpeg,
            intermediate.path(),
            &self.config.input,
            &self.config.output,
            &self.config.range,
            plan.mapping,
        )?;
        Ok(Some(frames))
    }
}

/// Best-effort removal of a partial output after failure.
fn remove_artifact(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "failed to remove partial output");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Point, QuadPoints, QualityProfile, TimeRange, TimeSpec};
    use crate::engine::progress::NullSink;
    use std::path::PathBuf;

    fn tools() -> ToolPaths {
        // Binaries that cannot exist, so plans fail at probing, never later
        ToolPaths {
            ffmpeg: "keyclip-no-such-ffmpeg-binary".into(),
            ffprobe: "keyclip-no-such-ffprobe-binary".into(),
        }
    }

    fn ranked() -> Vec<EncoderDescriptor> {
        vec![EncoderDescriptor::fallback()]
    }

    fn config(correction: CorrectionMode) -> JobConfig {
        JobConfig {
            input: PathBuf::from("keyclip-missing-input.mp4"),
            output: PathBuf::from("keyclip-test-output-never-created.mp4"),
            range: TimeRange::new(TimeSpec::from_seconds(2.0), TimeSpec::from_seconds(5.0))
                .unwrap(),
            correction,
            quality: QualityProfile::High,
            crf_override: None,
            requested_encoder: None,
            overwrite: false,
        }
    }

    #[test]
    fn degenerate_quad_fails_before_touching_the_source() {
        let p = Point::new(1.0, 1.0);
        let cfg = config(CorrectionMode::Quad(QuadPoints::new(p, p, p, p)));
        let err = JobPlan::prepare(&cfg, &tools(), &ranked()).unwrap_err();
        // DegenerateGeometry, not SourceUnreadable: geometry is checked first
        assert!(matches!(err, KeyclipError::DegenerateGeometry { .. }));
    }

    #[test]
    fn unreadable_source_fails_validation() {
        let cfg = config(CorrectionMode::Disabled);
        let err = JobPlan::prepare(&cfg, &tools(), &ranked()).unwrap_err();
        assert!(matches!(err, KeyclipError::SourceUnreadable { .. }));
        assert_eq!(err.code(), "input-validation");
    }

    #[test]
    fn failed_job_leaves_no_output_artifact() {
        let cfg = config(CorrectionMode::Disabled);
        let output = cfg.output.clone();
        let orchestrator = Orchestrator::new(cfg, tools(), ranked());
        assert!(orchestrator.run(&NullSink).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn unknown_requested_encoder_is_rejected() {
        let mut cfg = config(CorrectionMode::Disabled);
        cfg.requested_encoder = Some("h266_warp_drive".into());
        // Rejection happens after source probing, which already fails here;
        // assert on the selector directly instead
        let binding = ranked();
        let chosen = select_encoder(&binding, cfg.requested_encoder.as_deref());
        assert!(chosen.is_none());
    }
}
