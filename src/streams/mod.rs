//! Stream mapping for the mux step
//!
//! The output carries exactly one video stream and at most one audio
//! stream; audio is always copied verbatim from the original source, never
//! re-encoded.

/// Mapping of mux inputs: input 0 is the (possibly corrected) video-only
/// stream, input 1 the original source contributing audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxMapping {
    /// Whether the original source was probed to carry an audio track
    pub has_audio: bool,
}

impl MuxMapping {
    pub fn new(has_audio: bool) -> Self {
        Self { has_audio }
    }

    /// `-map`/codec arguments for the mux invocation.
    ///
    /// The audio map keeps the `?` suffix even when audio was probed, so a
    /// source whose audio track disappears between probe and mux still
    /// produces a video-only output instead of failing.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["-map".to_string(), "0:v:0".to_string()];
        if self.has_audio {
            args.push("-map".to_string());
            args.push("1:a:0?".to_string());
        }
        args.push("-c:v".to_string());
        args.push("copy".to_string());
        if self.has_audio {
            args.push("-c:a".to_string());
            args.push("copy".to_string());
        }
        args
    }
}
