//! Encoder backend probing and ranking
//!
//! Hardware candidates found in the collaborator's encoder listing are
//! verified with a short synthetic encode, because a listed encoder can
//! still be unusable at runtime (driver mismatch, missing libraries). A
//! failed verification drops the candidate from the ranked list without
//! failing the probe. The guaranteed fallback is always appended last, so
//! the ranked list is never empty.

use std::process::Stdio;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{BackendFamily, EncoderDescriptor};
use crate::utils::process::{collaborator_command, stderr_excerpt};

/// Verification outcome for one probed backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeOutcome {
    /// Listed and passed the synthetic encode
    Verified,
    /// Listed; accepted without a synthetic encode
    Listed,
    /// Listed but the synthetic encode failed
    Rejected,
    /// Not present in the encoder listing
    NotListed,
    /// Appended unconditionally; never probed
    Fallback,
}

/// One line of the diagnostics report
#[derive(Debug, Clone, Serialize)]
pub struct ProbeEntry {
    pub backend_id: String,
    pub display_name: String,
    pub outcome: ProbeOutcome,
    /// Tail of the verification stderr, kept for the diagnostics surface
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr_excerpt: Option<String>,
    /// Known-cause classification of a rejection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Structured probe report for the diagnostics collaborator
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub generated_at: String,
    pub ffmpeg_found: bool,
    pub entries: Vec<ProbeEntry>,
}

struct Candidate {
    display_name: &'static str,
    backend_id: &'static str,
    family: BackendFamily,
    /// Whether a synthetic encode must pass before ranking the candidate
    verify: bool,
}

/// Probe order: hardware first, then the container-level software encoder.
/// hevc_qsv is accepted from the listing alone, mirroring long-standing
/// behavior on machines where its synthetic test is unreliable.
const CANDIDATES: &[Candidate] = &[
    Candidate {
        display_name: "NVIDIA GPU (H.264)",
        backend_id: "h264_nvenc",
        family: BackendFamily::Hardware,
        verify: true,
    },
    Candidate {
        display_name: "NVIDIA GPU (H.265)",
        backend_id: "hevc_nvenc",
        family: BackendFamily::Hardware,
        verify: true,
    },
    Candidate {
        display_name: "Intel QuickSync (H.264)",
        backend_id: "h264_qsv",
        family: BackendFamily::Hardware,
        verify: true,
    },
    Candidate {
        display_name: "Intel QuickSync (H.265)",
        backend_id: "hevc_qsv",
        family: BackendFamily::Hardware,
        verify: false,
    },
    Candidate {
        display_name: "CPU (H.264)",
        backend_id: "libx264",
        family: BackendFamily::SoftwareContainer,
        verify: false,
    },
];

/// Probes the available encoder backends and ranks them
pub struct EncoderProber {
    ffmpeg: String,
}

impl EncoderProber {
    pub fn new(ffmpeg: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Run the full probe, producing the ranked backend list and the
    /// diagnostics report. Never fails: with no usable collaborator the
    /// ranked list still carries the fallback.
    pub fn probe(&self) -> (Vec<EncoderDescriptor>, ProbeReport) {
        let listing = self.encoder_listing();
        let ffmpeg_found = listing.is_some();
        if !ffmpeg_found {
            warn!("ffmpeg not found; only the fallback backend is available");
        }
        let listing = listing.unwrap_or_default();

        let mut ranked = Vec::new();
        let mut entries = Vec::new();

        for candidate in CANDIDATES {
            let entry = if !listing.contains(candidate.backend_id) {
                debug!(backend = candidate.backend_id, "not in encoder listing");
                ProbeEntry {
                    backend_id: candidate.backend_id.into(),
                    display_name: candidate.display_name.into(),
                    outcome: ProbeOutcome::NotListed,
                    stderr_excerpt: None,
                    note: None,
                }
            } else if candidate.verify {
                match self.verify_backend(candidate.backend_id) {
                    Ok(()) => {
                        info!(backend = candidate.backend_id, "verified");
                        ranked.push(EncoderDescriptor::new(
                            candidate.display_name,
                            candidate.backend_id,
                            candidate.family,
                        ));
                        ProbeEntry {
                            backend_id: candidate.backend_id.into(),
                            display_name: candidate.display_name.into(),
                            outcome: ProbeOutcome::Verified,
                            stderr_excerpt: None,
                            note: None,
                        }
                    }
                    Err(stderr) => {
                        let note = classify_rejection(&stderr);
                        warn!(backend = candidate.backend_id, %stderr, "verification failed");
                        ProbeEntry {
                            backend_id: candidate.backend_id.into(),
                            display_name: candidate.display_name.into(),
                            outcome: ProbeOutcome::Rejected,
                            stderr_excerpt: Some(stderr),
                            note: note.map(str::to_string),
                        }
                    }
                }
            } else {
                info!(backend = candidate.backend_id, "listed");
                ranked.push(EncoderDescriptor::new(
                    candidate.display_name,
                    candidate.backend_id,
                    candidate.family,
                ));
                ProbeEntry {
                    backend_id: candidate.backend_id.into(),
                    display_name: candidate.display_name.into(),
                    outcome: ProbeOutcome::Listed,
                    stderr_excerpt: None,
                    note: None,
                }
            };
            entries.push(entry);
        }

        let fallback = EncoderDescriptor::fallback();
        entries.push(ProbeEntry {
            backend_id: fallback.backend_id.clone(),
            display_name: fallback.display_name.clone(),
            outcome: ProbeOutcome::Fallback,
            stderr_excerpt: None,
            note: None,
        });
        ranked.push(fallback);

        let report = ProbeReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            ffmpeg_found,
            entries,
        };
        (ranked, report)
    }

    /// `ffmpeg -hide_banner -encoders` stdout, or `None` when the
    /// collaborator cannot be run at all.
    fn encoder_listing(&self) -> Option<String> {
        let output = collaborator_command(&self.ffmpeg)
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Short real invocation against a synthetic source; a capability
    /// listing alone is not trusted for hardware backends.
    fn verify_backend(&self, backend_id: &str) -> Result<(), String> {
        let mut cmd = collaborator_command(&self.ffmpeg);
        cmd.args(["-v", "error", "-f", "lavfi", "-i"])
            .arg("testsrc=duration=0.1:size=320x240:rate=1")
            .args(["-c:v", backend_id]);
        if backend_id.contains("nvenc") {
            cmd.args(["-preset", "fast"]);
        }
        cmd.args(["-f", "null", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        match cmd.output() {
            Ok(output) if output.status.success() => Ok(()),
            Ok(output) => Err(stderr_excerpt(&output.stderr, 4)),
            Err(e) => Err(format!("failed to start verification: {}", e)),
        }
    }
}

/// Map well-known NVENC failure text onto a human-readable cause.
fn classify_rejection(stderr: &str) -> Option<&'static str> {
    if stderr.contains("Driver does not support the required nvenc API version") {
        Some("NVIDIA driver is too old for this ffmpeg build")
    } else if stderr.contains("Cannot load nvcuda") {
        Some("CUDA driver missing or unloadable")
    } else if stderr.contains("No NVENC capable devices found") {
        Some("no NVENC-capable GPU present")
    } else {
        None
    }
}
