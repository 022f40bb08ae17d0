//! Construction of collaborator process invocations

use std::process::Command;

/// Build a `Command` for an external collaborator (ffmpeg/ffprobe).
///
/// On Windows the process window is suppressed, matching desktop usage where
/// console flashes from background encodes are unacceptable.
pub fn collaborator_command(program: &str) -> Command {
    let cmd = Command::new(program);
    apply_platform_flags(cmd)
}

#[cfg(windows)]
fn apply_platform_flags(mut cmd: Command) -> Command {
    use std::os::windows::process::CommandExt;
    use winapi::um::winbase::CREATE_NO_WINDOW;
    cmd.creation_flags(CREATE_NO_WINDOW);
    cmd
}

#[cfg(not(windows))]
fn apply_platform_flags(cmd: Command) -> Command {
    cmd
}

/// Trim a captured stderr blob down to a reportable excerpt: the last few
/// non-empty lines, where ffmpeg puts the actual cause.
pub fn stderr_excerpt(stderr: &[u8], max_lines: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_keeps_the_tail() {
        let blob = b"line one\n\nline two\nline three\n";
        assert_eq!(stderr_excerpt(blob, 2), "line two\nline three");
    }

    #[test]
    fn excerpt_of_short_output_is_whole() {
        assert_eq!(stderr_excerpt(b"only line", 5), "only line");
    }

    #[test]
    fn excerpt_of_empty_output_is_empty() {
        assert_eq!(stderr_excerpt(b"", 3), "");
    }
}
