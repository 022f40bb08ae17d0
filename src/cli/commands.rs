//! Command implementations

use std::io::Write;
use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::info;

use crate::cli::args::{ClipArgs, EncodersArgs, InspectArgs};
use crate::config::AppConfig;
use crate::domain::model::{
    CorrectionMode, JobConfig, QuadPoints, QualityProfile, TimeRange, TimeSpec,
};
use crate::encoder::probe::{EncoderProber, ProbeOutcome};
use crate::engine::orchestrator::Orchestrator;
use crate::engine::progress::ChannelSink;
use crate::engine::worker::JobRunner;
use crate::probe::SourceInspector;
use crate::utils::path::default_output_path;

/// Execute the clip command
pub fn clip(args: ClipArgs, config: &AppConfig) -> Result<()> {
    let start = TimeSpec::parse(&args.start).map_err(|e| anyhow!(e.user_message()))?;
    let end = TimeSpec::parse(&args.end).map_err(|e| anyhow!(e.user_message()))?;
    let range = TimeRange::new(start, end).map_err(|e| anyhow!(e.user_message()))?;

    let correction = parse_correction(&args)?;
    let quality = match &args.quality {
        Some(q) => QualityProfile::parse(q).map_err(|e| anyhow!(e.user_message()))?,
        None => config.quality,
    };
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input, start.seconds, end.seconds));

    let job = JobConfig {
        input: args.input,
        output: output.clone(),
        range,
        correction,
        quality,
        crf_override: args.crf,
        requested_encoder: args.encoder.or_else(|| config.encoder.clone()),
        overwrite: args.overwrite,
    };

    info!(input = %job.input.display(), output = %output.display(), "starting clip job");

    let prober = EncoderProber::new(config.tools.ffmpeg.as_str());
    let (ranked, _report) = prober.probe();

    let (tx, rx) = mpsc::channel();
    let sink = Arc::new(ChannelSink::new(tx));
    let orchestrator = Orchestrator::new(job, config.tools.clone(), ranked);

    let mut runner = JobRunner::new();
    runner
        .try_start(orchestrator, sink)
        .map_err(|e| anyhow!(e.user_message()))?;

    // The worker owns the job; this thread just renders progress until the
    // channel closes
    for update in rx {
        print!("\r[{:>5.1}%] {:<60}", update.percent, update.message);
        let _ = std::io::stdout().flush();
    }
    println!();

    match runner.join() {
        Some(Ok(outcome)) => {
            println!(
                "done: {} (encoder: {}{}, {:.1}s)",
                outcome.output_path.display(),
                outcome.encoder_name,
                outcome
                    .frames_processed
                    .map(|n| format!(", {} frames", n))
                    .unwrap_or_default(),
                outcome.elapsed.as_secs_f64(),
            );
            Ok(())
        }
        Some(Err(e)) => Err(anyhow!(e.user_message())),
        None => Err(anyhow!("job never started")),
    }
}

/// Resolve the correction mode from the corner arguments.
///
/// Corner coordinates are taken in source-frame pixels; any display-side
/// scaling must be undone before they reach this boundary.
fn parse_correction(args: &ClipArgs) -> Result<CorrectionMode> {
    let corners = [
        &args.top_left,
        &args.top_right,
        &args.bottom_left,
        &args.bottom_right,
    ];
    let given = corners.iter().filter(|c| c.is_some()).count();

    if given == 0 {
        return Ok(if args.keystone {
            CorrectionMode::FrameCorners
        } else {
            CorrectionMode::Disabled
        });
    }
    let (Some(tl), Some(tr), Some(bl), Some(br)) = (
        args.top_left.as_deref(),
        args.top_right.as_deref(),
        args.bottom_left.as_deref(),
        args.bottom_right.as_deref(),
    ) else {
        return Err(anyhow!(
            "corner correction needs all four corners (got {})",
            given
        ));
    };

    let parse = |s: &str| {
        s.parse()
            .map_err(|e: crate::error::KeyclipError| anyhow!(e.user_message()))
    };
    Ok(CorrectionMode::Quad(QuadPoints::new(
        parse(tl)?,
        parse(tr)?,
        parse(bl)?,
        parse(br)?,
    )))
}

/// Execute the inspect command
pub fn inspect(args: InspectArgs, config: &AppConfig) -> Result<()> {
    let inspector = SourceInspector::new(config.tools.ffprobe.as_str());
    let info = inspector
        .inspect(&args.input)
        .map_err(|e| anyhow!(e.user_message()))?;

    if args.json {
        let mut value = serde_json::to_value(&info)?;
        value["duration_seconds"] = serde_json::json!(info.duration_seconds());
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("resolution:  {}x{}", info.width, info.height);
        println!("frame rate:  {:.3} fps", info.frame_rate);
        println!("frames:      {}", info.frame_count);
        println!(
            "duration:    {}",
            TimeSpec::from_seconds(info.duration_seconds()).format_hms()
        );
        println!("audio:       {}", if info.has_audio { "yes" } else { "none" });
    }
    Ok(())
}

/// Execute the encoders command
pub fn encoders(args: EncodersArgs, config: &AppConfig) -> Result<()> {
    let prober = EncoderProber::new(config.tools.ffmpeg.as_str());
    let (ranked, report) = prober.probe();

    if args.json {
        let value = serde_json::json!({
            "ranked": ranked,
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("ranked encoder backends:");
    for (i, descriptor) in ranked.iter().enumerate() {
        println!(
            "  {}. {} [{}] ({})",
            i + 1,
            descriptor.display_name,
            descriptor.backend_id,
            descriptor.family
        );
    }
    println!();
    println!("probe report ({}):", report.generated_at);
    if !report.ffmpeg_found {
        println!("  ffmpeg was not found; only the fallback backend is usable");
    }
    for entry in &report.entries {
        let outcome = match entry.outcome {
            ProbeOutcome::Verified => "verified",
            ProbeOutcome::Listed => "listed",
            ProbeOutcome::Rejected => "rejected",
            ProbeOutcome::NotListed => "not listed",
            ProbeOutcome::Fallback => "fallback (always available)",
        };
        println!("  {:<12} {}", entry.backend_id, outcome);
        if let Some(note) = &entry.note {
            println!("               cause: {}", note);
        }
        if let Some(stderr) = &entry.stderr_excerpt {
            for line in stderr.lines() {
                println!("               | {}", line);
            }
        }
    }
    Ok(())
}
