//! Output path helpers

use std::path::{Path, PathBuf};

use crate::error::{KeyclipError, KeyclipResult};

/// Default output name next to the input: `<stem>_clip_<start>-<end>.mp4`.
///
/// Times are embedded with a decimal point replaced so the name stays
/// shell-friendly.
pub fn default_output_path(input: &Path, start_seconds: f64, end_seconds: f64) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "clip".to_string());
    let name = format!(
        "{}_clip_{}-{}.mp4",
        stem,
        fmt_seconds(start_seconds),
        fmt_seconds(end_seconds)
    );
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
        _ => PathBuf::from(name),
    }
}

fn fmt_seconds(seconds: f64) -> String {
    format!("{:.3}", seconds).replace('.', "_")
}

/// Create the output's parent directory when it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> KeyclipResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(KeyclipError::Io)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_name_embeds_stem_and_times() {
        let out = default_output_path(Path::new("/videos/talk.mp4"), 2.0, 5.5);
        assert_eq!(
            out,
            PathBuf::from("/videos/talk_clip_2_000-5_500.mp4")
        );
    }

    #[test]
    fn bare_input_name_stays_relative() {
        let out = default_output_path(Path::new("talk.mov"), 0.0, 1.0);
        assert_eq!(out, PathBuf::from("talk_clip_0_000-1_000.mp4"));
    }
}
