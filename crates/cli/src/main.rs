use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use clap::Parser;

use facetrack_core::capture::infrastructure::image_sequence_capture::ImageSequenceCapture;
use facetrack_core::detection::infrastructure::replay_detector::ReplayDetector;
use facetrack_core::rendering::domain::frame_sink::{FrameSink, NullFrameSink};
use facetrack_core::rendering::infrastructure::image_sequence_writer::ImageSequenceWriter;
use facetrack_core::reporting::domain::report_sink::ReportSink;
use facetrack_core::reporting::infrastructure::log_report_sink::LogReportSink;
use facetrack_core::reporting::infrastructure::writer_report_sink::FileReportSink;
use facetrack_core::session::session_config::SessionConfig;
use facetrack_core::session::session_logger::LogSessionLogger;
use facetrack_core::session::tracking_session::{SessionParts, TrackingSession};
use facetrack_core::shared::constants::QUIT_KEY;
use facetrack_core::shared::error::BoxError;
use facetrack_core::tracking::domain::tracker_config::{AppendPolicy, CentroidRule, PrunePolicy};
use facetrack_core::tracking::infrastructure::shared_track_store::SharedTrackStore;

/// Tracks faces across a frame sequence and reports how many are visible.
///
/// Type `q` and press Enter to stop early.
#[derive(Parser)]
#[command(name = "facetrack")]
struct Cli {
    /// Directory of frames, processed in file-name order.
    frames: PathBuf,

    /// Detections per frame: {"frames": [[[left, top, right, bottom], ...], ...]}.
    detections: PathBuf,

    /// Config file (default: the per-user FaceTrack/config.json, if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum centroid distance, in pixels, for a detection to continue a track.
    #[arg(long)]
    threshold: Option<f64>,

    /// Device label written into each report.
    #[arg(long)]
    device_id: Option<String>,

    /// Milliseconds between face-count reports.
    #[arg(long)]
    report_interval_ms: Option<u64>,

    /// Pause after each frame, in milliseconds, to mimic a live camera.
    #[arg(long)]
    frame_interval_ms: Option<u64>,

    /// Do not mirror frames before detection.
    #[arg(long)]
    no_mirror: bool,

    /// Centroid rule: biased or geometric.
    #[arg(long)]
    centroid_rule: Option<CentroidRule>,

    /// Handling of unmatched tracks when faces appear: per_unmatched_track or once_per_detection.
    #[arg(long)]
    append_policy: Option<AppendPolicy>,

    /// Handling of unmatched tracks when faces leave: in_place or reconciled.
    #[arg(long)]
    prune_policy: Option<PrunePolicy>,

    /// Keep existing tracks on frames with no detections.
    #[arg(long)]
    keep_on_empty: bool,

    /// Append reports to this file instead of logging them.
    #[arg(long)]
    report_file: Option<PathBuf>,

    /// Write annotated frames to this directory.
    #[arg(long)]
    annotated_dir: Option<PathBuf>,

    /// Log progress every N frames.
    #[arg(long, default_value = "30")]
    progress_every: usize,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), BoxError> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    let detector = ReplayDetector::from_path(&cli.detections)?;

    let capture = ImageSequenceCapture::new(cli.frames.clone(), config.mirror);
    let frame_sink: Box<dyn FrameSink> = match &cli.annotated_dir {
        Some(dir) => Box::new(ImageSequenceWriter::new(dir.clone())),
        None => Box::new(NullFrameSink),
    };
    let report_sink: Box<dyn ReportSink> = match &cli.report_file {
        Some(path) => Box::new(FileReportSink::append_to(path)?),
        None => Box::new(LogReportSink),
    };

    let session = TrackingSession::new(config, SharedTrackStore::new());
    spawn_quit_listener(session.cancel_handle());

    let summary = session.run(SessionParts {
        capture: Box::new(capture),
        detector: Box::new(detector),
        frame_sink,
        report_sink,
        logger: Box::new(LogSessionLogger::new(cli.progress_every)),
    })?;

    eprintln!(
        "Processed {} frames, {} reports, {} face(s) tracked at exit",
        summary.frames, summary.reports, summary.face_count
    );
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), BoxError> {
    if !cli.frames.is_dir() {
        return Err(format!("Frame directory not found: {}", cli.frames.display()).into());
    }
    if !cli.detections.is_file() {
        return Err(format!("Detections file not found: {}", cli.detections.display()).into());
    }
    if cli.progress_every == 0 {
        return Err("--progress-every must be at least 1".into());
    }
    Ok(())
}

/// File (or defaults) first, then flags on top.
fn build_config(cli: &Cli) -> Result<SessionConfig, BoxError> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::load_default()?,
    };

    if let Some(threshold) = cli.threshold {
        config.tracker.distance_threshold = threshold;
    }
    if let Some(device_id) = &cli.device_id {
        config.device_id = device_id.clone();
    }
    if let Some(ms) = cli.report_interval_ms {
        config.report_interval_ms = ms;
    }
    if let Some(ms) = cli.frame_interval_ms {
        config.frame_interval_ms = ms;
    }
    if cli.no_mirror {
        config.mirror = false;
    }
    if let Some(rule) = cli.centroid_rule {
        config.tracker.centroid_rule = rule;
    }
    if let Some(policy) = cli.append_policy {
        config.tracker.append_policy = policy;
    }
    if let Some(policy) = cli.prune_policy {
        config.tracker.prune_policy = policy;
    }
    if cli.keep_on_empty {
        config.tracker.clear_on_empty = false;
    }

    config.validate()?;
    Ok(config)
}

/// Raises `cancelled` when a line holding only the quit key arrives on stdin.
fn spawn_quit_listener(cancelled: Arc<AtomicBool>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if is_quit(&line) {
                log::info!("Quit requested");
                cancelled.store(true, Ordering::Relaxed);
                break;
            }
        }
    });
}

fn is_quit(line: &str) -> bool {
    let mut chars = line.trim().chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.eq_ignore_ascii_case(&QUIT_KEY))
}
