// Domain rules - Validation policies applied before any processing starts


use crate::domain::model::{CorrectionMode, JobConfig, QuadPoints, VideoInfo};
use crate::error::{KeyclipError, KeyclipResult};

/// Pre-flight validation for a job.
///
/// Every violation here is terminal input error territory: nothing has been
/// extracted or encoded yet, and no artifacts exist to clean up.
pub struct JobValidator;

impl JobValidator {
    /// Checks that do not need the source opened: corner geometry.
    ///
    /// Runs before probing so a degenerate quad is reported even when the
    /// source itself is fine, and vice versa.
    pub fn validate_geometry(config: &JobConfig) -> KeyclipResult<()> {
        if let CorrectionMode::Quad(quad) = &config.correction {
            if let Some(reason) = quad.degenerate_reason() {
                return Err(KeyclipError::DegenerateGeometry { message: reason });
            }
        }
        Ok(())
    }

    /// Checks that need source properties: the trim window must fit the
    /// probed duration.
    pub fn validate_against_source(config: &JobConfig, info: &VideoInfo) -> KeyclipResult<()> {
        let duration = info.duration_seconds();
        if config.range.end_seconds() > duration {
            return Err(KeyclipError::InputValidation {
                message: format!(
                    "end time {:.3}s is past the source duration {:.3}s",
                    config.range.end_seconds(),
                    duration
                ),
            });
        }
        Ok(())
    }

    /// The output container is fixed to mp4, and an existing output is only
    /// replaced when overwrite was requested.
    pub fn validate_output(config: &JobConfig) -> KeyclipResult<()> {
        let is_mp4 = config
            .output
            .extension()
            .map(|e| e.eq_ignore_ascii_case("mp4"))
            .unwrap_or(false);
        if !is_mp4 {
            return Err(KeyclipError::InputValidation {
                message: format!(
                    "output '{}' must use the .mp4 container",
                    config.output.display()
                ),
            });
        }
        if !config.overwrite && config.output.exists() {
            return Err(KeyclipError::InputValidation {
                message: format!(
                    "output '{}' already exists (pass --overwrite to replace it)",
                    config.output.display()
                ),
            });
        }
        Ok(())
    }
}

/// Corner points to use when correction is requested without explicit
/// coordinates: the frame's own corners.
pub fn default_quad(info: &VideoInfo) -> QuadPoints {
    QuadPoints::frame_corners(info.width, info.height)
}
