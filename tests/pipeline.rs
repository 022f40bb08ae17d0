//! End-to-end pipeline tests against real collaborator processes
//!
//! These tests need ffmpeg and ffprobe on PATH; they skip (pass vacuously)
//! when either is missing so the suite stays runnable on bare machines.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc;
use std::sync::Arc;

use tempfile::TempDir;

use keyclip::engine::progress::{ChannelSink, ProgressSink};
use keyclip::{
    CorrectionMode, EncoderDescriptor, JobConfig, Orchestrator, QualityProfile, TimeRange,
    TimeSpec, ToolPaths,
};

fn tools_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|tool| {
        Command::new(tool)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    })
}

/// 10 second 640x480 30fps synthetic source, optionally with a sine audio
/// track. Encoded with the built-in mpeg4 encoder so fixture generation
/// works on any ffmpeg build.
fn make_fixture(dir: &Path, with_audio: bool) -> PathBuf {
    let path = dir.join(if with_audio { "src_a.mp4" } else { "src_v.mp4" });
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-y", "-v", "error"])
        .args(["-f", "lavfi", "-i", "testsrc=duration=10:size=640x480:rate=30"]);
    if with_audio {
        cmd.args(["-f", "lavfi", "-i", "sine=frequency=440:duration=10"]);
    }
    cmd.args(["-c:v", "mpeg4", "-q:v", "5", "-pix_fmt", "yuv420p"]);
    if with_audio {
        cmd.args(["-c:a", "aac", "-shortest"]);
    }
    cmd.arg(&path);
    let status = cmd.status().expect("fixture encode starts");
    assert!(status.success(), "fixture encode succeeds");
    path
}

fn fallback_only() -> Vec<EncoderDescriptor> {
    vec![EncoderDescriptor::fallback()]
}

fn job(input: PathBuf, output: PathBuf, start: f64, end: f64, correction: CorrectionMode) -> JobConfig {
    JobConfig {
        input,
        output,
        range: TimeRange::new(TimeSpec::from_seconds(start), TimeSpec::from_seconds(end))
            .unwrap(),
        correction,
        quality: QualityProfile::Standard,
        crf_override: None,
        requested_encoder: None,
        overwrite: true,
    }
}

fn probe_output(path: &Path) -> keyclip::VideoInfo {
    keyclip::probe::SourceInspector::new("ffprobe")
        .inspect(path)
        .expect("output probes cleanly")
}

#[test]
fn trim_produces_the_rounded_frame_count_and_keeps_audio() {
    if !tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not available");
        return;
    }
    let dir = TempDir::new().unwrap();
    let input = make_fixture(dir.path(), true);
    let output = dir.path().join("out.mp4");

    let orchestrator = Orchestrator::new(
        job(input, output.clone(), 2.0, 5.0, CorrectionMode::Disabled),
        ToolPaths::default(),
        fallback_only(),
    );
    let (tx, rx) = mpsc::channel();
    let outcome = orchestrator
        .run(&ChannelSink::new(tx))
        .expect("trim job succeeds");
    let updates: Vec<_> = rx.try_iter().collect();

    assert!(output.exists());
    assert_eq!(outcome.encoder_name, "CPU (MPEG-4 built-in)");
    assert!(updates.iter().any(|u| u.percent >= 100.0));

    let info = probe_output(&output);
    // round(5*30) - round(2*30) = 90, give or take container rounding
    assert!(
        (89..=91).contains(&info.frame_count),
        "expected ~90 frames, got {}",
        info.frame_count
    );
    assert!(info.has_audio, "original audio must be preserved");
    let duration = info.duration_seconds();
    assert!(
        (2.8..=3.2).contains(&duration),
        "expected ~3s, got {:.3}s",
        duration
    );
}

#[test]
fn corrected_job_materializes_cleans_up_and_muxes_audio() {
    if !tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not available");
        return;
    }
    let dir = TempDir::new().unwrap();
    let input = make_fixture(dir.path(), true);
    let output = dir.path().join("corrected.mp4");

    let orchestrator = Orchestrator::new(
        job(input, output.clone(), 2.0, 4.0, CorrectionMode::FrameCorners),
        ToolPaths::default(),
        fallback_only(),
    );
    let (tx, rx) = mpsc::channel();
    let outcome = orchestrator
        .run(&ChannelSink::new(tx))
        .expect("corrected job succeeds");
    let updates: Vec<_> = rx.try_iter().collect();

    assert!(output.exists());
    let frames = outcome.frames_processed.expect("frame pipeline ran");
    assert!((59..=61).contains(&frames), "expected ~60 frames, got {}", frames);

    // Batched frame-loop progress reached the surface
    assert!(updates.iter().any(|u| u.message.contains("correcting")));
    assert!(updates.iter().any(|u| u.message.contains("muxing")));

    let info = probe_output(&output);
    assert!(info.has_audio, "audio must survive the two-phase path");
    assert!((59..=61).contains(&info.frame_count));

    // The intermediate artifact is gone on the success path
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(".keyclip-"))
        .collect();
    assert!(leftovers.is_empty(), "intermediate must be deleted");
}

#[test]
fn audio_less_source_still_muxes_to_a_video_only_output() {
    if !tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not available");
        return;
    }
    let dir = TempDir::new().unwrap();
    let input = make_fixture(dir.path(), false);
    let output = dir.path().join("silent.mp4");

    let orchestrator = Orchestrator::new(
        job(input, output.clone(), 1.0, 2.0, CorrectionMode::FrameCorners),
        ToolPaths::default(),
        fallback_only(),
    );
    let sink: Arc<dyn ProgressSink> = {
        let (tx, _rx) = mpsc::channel();
        Arc::new(ChannelSink::new(tx))
    };
    orchestrator
        .run(sink.as_ref())
        .expect("video-only source must not fail the mux");

    let info = probe_output(&output);
    assert!(!info.has_audio, "output stays video-only");
    assert!((29..=31).contains(&info.frame_count));
}

#[test]
fn failing_backend_falls_back_and_reports_the_fallback_name() {
    if !tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not available");
        return;
    }
    let dir = TempDir::new().unwrap();
    let input = make_fixture(dir.path(), true);
    let output = dir.path().join("fallback.mp4");

    // A backend that no ffmpeg build knows simulates an unusable hardware
    // encoder surviving the ranked list
    let ranked = vec![
        EncoderDescriptor::new(
            "Bogus GPU (H.264)",
            "h264_keyclip_bogus",
            keyclip::BackendFamily::Hardware,
        ),
        EncoderDescriptor::fallback(),
    ];
    let orchestrator = Orchestrator::new(
        job(input, output.clone(), 0.0, 1.0, CorrectionMode::Disabled),
        ToolPaths::default(),
        ranked,
    );
    let (tx, _rx) = mpsc::channel();
    let outcome = orchestrator
        .run(&ChannelSink::new(tx))
        .expect("fallback rescues the job");

    assert!(output.exists());
    assert_eq!(outcome.encoder_name, "CPU (MPEG-4 built-in)");
}

#[test]
fn range_past_source_duration_fails_cleanly() {
    if !tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not available");
        return;
    }
    let dir = TempDir::new().unwrap();
    let input = make_fixture(dir.path(), true);
    let output = dir.path().join("never.mp4");

    let orchestrator = Orchestrator::new(
        job(input, output.clone(), 2.0, 60.0, CorrectionMode::Disabled),
        ToolPaths::default(),
        fallback_only(),
    );
    let (tx, _rx) = mpsc::channel();
    let err = orchestrator.run(&ChannelSink::new(tx)).unwrap_err();
    assert_eq!(err.code(), "input-validation");
    assert!(!output.exists());
}
