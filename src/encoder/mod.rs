//! Encoder backend selection: descriptors, ranking, and quality tables

pub mod invoke;
pub mod probe;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::model::QualityProfile;

/// Backend id of the guaranteed fallback: ffmpeg's built-in MPEG-4 part 2
/// encoder, present in every build regardless of optional encoder libraries.
pub const FALLBACK_BACKEND_ID: &str = "mpeg4";

/// Classification of an encoder backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendFamily {
    /// Vendor hardware encoder, verified by a synthetic encode at probe time
    Hardware,
    /// General software encoder available at the container level (libx264)
    SoftwareContainer,
    /// Guaranteed-present software fallback, never probed
    FallbackSoftware,
}

impl fmt::Display for BackendFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hardware => "hardware",
            Self::SoftwareContainer => "software",
            Self::FallbackSoftware => "fallback",
        };
        write!(f, "{}", name)
    }
}

/// One ranked entry of the probed encoder list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderDescriptor {
    /// Human-facing name, reported in terminal job status
    pub display_name: String,
    /// Codec id passed to the collaborator's `-c:v`
    pub backend_id: String,
    pub family: BackendFamily,
}

impl EncoderDescriptor {
    pub fn new(display_name: &str, backend_id: &str, family: BackendFamily) -> Self {
        Self {
            display_name: display_name.to_string(),
            backend_id: backend_id.to_string(),
            family,
        }
    }

    /// The guaranteed fallback descriptor
    pub fn fallback() -> Self {
        Self::new(
            "CPU (MPEG-4 built-in)",
            FALLBACK_BACKEND_ID,
            BackendFamily::FallbackSoftware,
        )
    }
}

/// Quality arguments for one encode invocation.
///
/// Each backend family maps the four profile levels onto a fixed parameter
/// table; `crf_override` replaces the table's quantizer on the CRF scale
/// (rescaled to qscale for the fallback family).
pub fn quality_args(
    descriptor: &EncoderDescriptor,
    profile: QualityProfile,
    crf_override: Option<u8>,
) -> Vec<String> {
    let id = descriptor.backend_id.as_str();
    if id.contains("nvenc") {
        let (preset, cq) = match profile {
            QualityProfile::Highest => ("slow", 18),
            QualityProfile::High => ("medium", 23),
            QualityProfile::Standard => ("fast", 28),
            QualityProfile::Fast => ("p1", 30),
        };
        let cq = crf_override.map(u32::from).unwrap_or(cq);
        svec(&["-preset", preset, "-cq", &cq.to_string()])
    } else if id.contains("qsv") {
        let (preset, gq) = match profile {
            QualityProfile::Highest => ("veryslow", 18),
            QualityProfile::High => ("medium", 23),
            QualityProfile::Standard => ("fast", 28),
            QualityProfile::Fast => ("veryfast", 30),
        };
        let gq = crf_override.map(u32::from).unwrap_or(gq);
        svec(&["-preset", preset, "-global_quality", &gq.to_string()])
    } else if descriptor.family == BackendFamily::FallbackSoftware {
        let q = match profile {
            QualityProfile::Highest => 2,
            QualityProfile::High => 5,
            QualityProfile::Standard => 8,
            QualityProfile::Fast => 12,
        };
        let q = crf_override.map(crf_to_qscale).unwrap_or(q);
        svec(&["-q:v", &q.to_string()])
    } else {
        let (preset, crf) = match profile {
            QualityProfile::Highest => ("veryslow", 18),
            QualityProfile::High => ("medium", 23),
            QualityProfile::Standard => ("fast", 28),
            QualityProfile::Fast => ("ultrafast", 30),
        };
        let crf = crf_override.map(u32::from).unwrap_or(crf);
        svec(&["-preset", preset, "-crf", &crf.to_string()])
    }
}

/// The fallback encoder only understands qscale 1..=31; rescale the 0..=51
/// CRF range proportionally.
fn crf_to_qscale(crf: u8) -> u32 {
    ((f64::from(crf) * 31.0 / 51.0).round() as u32).clamp(1, 31)
}

fn svec(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Pick the backend for a job from the ranked list: an explicit request by
/// backend id wins, otherwise the top-ranked entry.
pub fn select_encoder<'a>(
    ranked: &'a [EncoderDescriptor],
    requested: Option<&str>,
) -> Option<&'a EncoderDescriptor> {
    match requested {
        Some(id) => ranked.iter().find(|d| d.backend_id == id),
        None => ranked.first(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nvenc() -> EncoderDescriptor {
        EncoderDescriptor::new("NVIDIA GPU (H.264)", "h264_nvenc", BackendFamily::Hardware)
    }

    fn x264() -> EncoderDescriptor {
        EncoderDescriptor::new("CPU (H.264)", "libx264", BackendFamily::SoftwareContainer)
    }

    #[test]
    fn hardware_family_uses_constant_quantizer() {
        let args = quality_args(&nvenc(), QualityProfile::High, None);
        assert_eq!(args, vec!["-preset", "medium", "-cq", "23"]);
    }

    #[test]
    fn software_family_uses_crf() {
        let args = quality_args(&x264(), QualityProfile::Highest, None);
        assert_eq!(args, vec!["-preset", "veryslow", "-crf", "18"]);
        let fast = quality_args(&x264(), QualityProfile::Fast, None);
        assert_eq!(fast, vec!["-preset", "ultrafast", "-crf", "30"]);
    }

    #[test]
    fn qsv_uses_global_quality() {
        let qsv = EncoderDescriptor::new("Intel QuickSync (H.264)", "h264_qsv", BackendFamily::Hardware);
        let args = quality_args(&qsv, QualityProfile::Standard, None);
        assert_eq!(args, vec!["-preset", "fast", "-global_quality", "28"]);
    }

    #[test]
    fn fallback_uses_qscale_ladder() {
        let args = quality_args(&EncoderDescriptor::fallback(), QualityProfile::High, None);
        assert_eq!(args, vec!["-q:v", "5"]);
    }

    #[test]
    fn crf_override_replaces_table_quantizer() {
        let args = quality_args(&x264(), QualityProfile::High, Some(20));
        assert_eq!(args, vec!["-preset", "medium", "-crf", "20"]);
        let hw = quality_args(&nvenc(), QualityProfile::High, Some(20));
        assert_eq!(hw, vec!["-preset", "medium", "-cq", "20"]);
    }

    #[test]
    fn crf_override_rescales_for_fallback() {
        let args = quality_args(&EncoderDescriptor::fallback(), QualityProfile::High, Some(51));
        assert_eq!(args, vec!["-q:v", "31"]);
        let low = quality_args(&EncoderDescriptor::fallback(), QualityProfile::High, Some(0));
        assert_eq!(low, vec!["-q:v", "1"]);
    }

    #[test]
    fn selection_defaults_to_top_rank() {
        let ranked = vec![nvenc(), x264(), EncoderDescriptor::fallback()];
        assert_eq!(select_encoder(&ranked, None).unwrap().backend_id, "h264_nvenc");
    }

    #[test]
    fn selection_honors_explicit_request() {
        let ranked = vec![nvenc(), x264(), EncoderDescriptor::fallback()];
        let chosen = select_encoder(&ranked, Some("libx264")).unwrap();
        assert_eq!(chosen.backend_id, "libx264");
        assert!(select_encoder(&ranked, Some("av1_magic")).is_none());
    }
}
