//! Application configuration
//!
//! Precedence follows CLI > environment > file > defaults. The file is
//! `keyclip.toml` in the working directory; environment overrides use the
//! `KEYCLIP_*` prefix.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::model::QualityProfile;

/// Collaborator binaries used by the pipeline
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".into(),
            ffprobe: "ffprobe".into(),
        }
    }
}

/// Partial configuration as it appears in `keyclip.toml`
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    quality: Option<String>,
    encoder: Option<String>,
    ffmpeg: Option<String>,
    ffprobe: Option<String>,
}

/// Resolved application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Default quality level when the CLI does not specify one
    pub quality: QualityProfile,
    /// Preferred encoder backend id, overriding the probe ranking
    pub encoder: Option<String>,
    pub tools: ToolPaths,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            quality: QualityProfile::High,
            encoder: None,
            tools: ToolPaths::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location and environment.
    pub fn load() -> Self {
        let mut config = Self::default();
        config.apply_file(Path::new("keyclip.toml"));
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    fn apply_file(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config file unreadable; ignoring");
                return;
            }
        };
        match toml::from_str::<FileConfig>(&raw) {
            Ok(file) => {
                debug!(path = %path.display(), "loaded config file");
                self.apply_partial(file);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "config file invalid; ignoring"),
        }
    }

    fn apply_partial(&mut self, file: FileConfig) {
        if let Some(quality) = file.quality {
            match QualityProfile::parse(&quality) {
                Ok(parsed) => self.quality = parsed,
                Err(_) => warn!(%quality, "unknown quality in config; keeping default"),
            }
        }
        if file.encoder.is_some() {
            self.encoder = file.encoder;
        }
        if let Some(ffmpeg) = file.ffmpeg {
            self.tools.ffmpeg = ffmpeg;
        }
        if let Some(ffprobe) = file.ffprobe {
            self.tools.ffprobe = ffprobe;
        }
    }

    /// Apply `KEYCLIP_*` overrides through an injectable lookup.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(quality) = var("KEYCLIP_QUALITY") {
            match QualityProfile::parse(&quality) {
                Ok(parsed) => self.quality = parsed,
                Err(_) => warn!(%quality, "unknown quality in KEYCLIP_QUALITY; ignoring"),
            }
        }
        if let Some(encoder) = var("KEYCLIP_ENCODER") {
            self.encoder = Some(encoder);
        }
        if let Some(ffmpeg) = var("KEYCLIP_FFMPEG") {
            self.tools.ffmpeg = ffmpeg;
        }
        if let Some(ffprobe) = var("KEYCLIP_FFPROBE") {
            self.tools.ffprobe = ffprobe;
        }
    }
}
