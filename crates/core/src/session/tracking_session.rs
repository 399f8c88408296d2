use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use crate::capture::domain::capture_source::CaptureSource;
use crate::detection::domain::face_detector::FaceDetector;
use crate::rendering::domain::frame_sink::FrameSink;
use crate::rendering::domain::overlay_renderer::OverlayRenderer;
use crate::reporting::domain::report_sink::ReportSink;
use crate::reporting::reporter::FaceCountReporter;
use crate::session::error::SessionError;
use crate::session::session_config::SessionConfig;
use crate::session::session_logger::SessionLogger;
use crate::shared::error::BoxError;
use crate::tracking::domain::frame_observer::FrameObserver;
use crate::tracking::domain::track_store::TrackStore;

/// Collaborators handed to [`TrackingSession::run`]. Each is moved onto
/// the thread that uses it.
pub struct SessionParts {
    pub capture: Box<dyn CaptureSource>,
    pub detector: Box<dyn FaceDetector>,
    pub frame_sink: Box<dyn FrameSink>,
    pub report_sink: Box<dyn ReportSink>,
    pub logger: Box<dyn SessionLogger>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames: usize,
    pub reports: usize,
    /// Face count published after the last processed frame.
    pub face_count: usize,
}

/// Runs the frame loop and the face-count reporter side by side over one
/// track store.
///
/// Both threads watch the same cancellation flag. The frame loop raises it
/// when capture runs out or fails; the reporter raises it when its sink
/// fails; callers raise it through [`cancel_handle`](Self::cancel_handle).
/// A session is meant to run once.
pub struct TrackingSession<S: TrackStore + Clone + 'static> {
    config: SessionConfig,
    store: S,
    renderer: OverlayRenderer,
    cancelled: Arc<AtomicBool>,
}

impl<S: TrackStore + Clone + 'static> TrackingSession<S> {
    pub fn new(config: SessionConfig, store: S) -> Self {
        Self {
            config,
            store,
            renderer: OverlayRenderer::default(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Blocks until the frame loop ends, then stops the reporter and joins
    /// both threads. When both fail, the frame loop's error is returned.
    /// An invalid config fails before any thread starts.
    pub fn run(&self, parts: SessionParts) -> Result<SessionSummary, SessionError> {
        self.config.validate()?;
        let observer = FrameObserver::new(self.config.tracker.clone())?;

        let SessionParts {
            capture,
            detector,
            frame_sink,
            report_sink,
            logger,
        } = parts;

        log::info!(
            "Starting session for {} (threshold {}, report every {} ms)",
            self.config.device_id,
            self.config.tracker.distance_threshold,
            self.config.report_interval_ms
        );

        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let reporter = FaceCountReporter::new(
            self.config.device_id.clone(),
            self.store.clone(),
            report_sink,
        );
        let reporter_handle = spawn_reporter(
            reporter,
            self.config.report_interval(),
            Arc::clone(&self.cancelled),
            shutdown_rx,
        );

        let frame_loop = FrameLoop {
            capture,
            detector,
            frame_sink,
            logger,
            observer,
            renderer: self.renderer,
            store: self.store.clone(),
            cancelled: Arc::clone(&self.cancelled),
            frame_interval: self.config.frame_interval(),
        };
        let frame_handle = thread::spawn(move || frame_loop.run());

        let frame_result = frame_handle.join();
        self.cancelled.store(true, Ordering::Relaxed);
        drop(shutdown_tx);
        let reporter_result = reporter_handle.join();

        let (frames, reports) = join_activities(frame_result, reporter_result)?;
        let summary = SessionSummary {
            frames,
            reports,
            face_count: self.store.face_count(),
        };
        log::info!(
            "Session for {} finished: {} frames, {} reports",
            self.config.device_id,
            summary.frames,
            summary.reports
        );
        Ok(summary)
    }
}

fn spawn_reporter<S: TrackStore + 'static>(
    mut reporter: FaceCountReporter<S>,
    interval: Duration,
    cancelled: Arc<AtomicBool>,
    shutdown: Receiver<()>,
) -> JoinHandle<Result<usize, BoxError>> {
    thread::spawn(move || {
        let result = reporter.run(interval, &cancelled, &shutdown);
        if let Err(e) = &result {
            log::error!("Reporter stopped: {e}");
            cancelled.store(true, Ordering::Relaxed);
        }
        result
    })
}

fn join_activities(
    frame_result: thread::Result<Result<usize, SessionError>>,
    reporter_result: thread::Result<Result<usize, BoxError>>,
) -> Result<(usize, usize), SessionError> {
    fn set_if_none(slot: &mut Option<SessionError>, err: SessionError) {
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    let mut first_error = None;

    let frames = match frame_result {
        Ok(Ok(frames)) => frames,
        Ok(Err(e)) => {
            set_if_none(&mut first_error, e);
            0
        }
        Err(_) => {
            set_if_none(&mut first_error, SessionError::ThreadPanicked("frame loop"));
            0
        }
    };

    let reports = match reporter_result {
        Ok(Ok(reports)) => reports,
        Ok(Err(e)) => {
            set_if_none(&mut first_error, SessionError::Report(e));
            0
        }
        Err(_) => {
            set_if_none(&mut first_error, SessionError::ThreadPanicked("reporter"));
            0
        }
    };

    match first_error {
        Some(e) => Err(e),
        None => Ok((frames, reports)),
    }
}

/// Owns capture, detection and overlay output for the lifetime of the
/// session. The only writer of the track store.
struct FrameLoop<S: TrackStore> {
    capture: Box<dyn CaptureSource>,
    detector: Box<dyn FaceDetector>,
    frame_sink: Box<dyn FrameSink>,
    logger: Box<dyn SessionLogger>,
    observer: FrameObserver,
    renderer: OverlayRenderer,
    store: S,
    cancelled: Arc<AtomicBool>,
    frame_interval: Option<Duration>,
}

impl<S: TrackStore> FrameLoop<S> {
    fn run(mut self) -> Result<usize, SessionError> {
        let result = match self.capture.open() {
            Ok(()) => self.process_frames(),
            Err(e) => Err(SessionError::Capture(e)),
        };

        self.capture.release();
        self.cancelled.store(true, Ordering::Relaxed);

        let closed = self.frame_sink.close().map_err(SessionError::FrameSink);
        self.logger.summary();

        let frames = result?;
        closed?;
        Ok(frames)
    }

    fn process_frames(&mut self) -> Result<usize, SessionError> {
        let Self {
            capture,
            detector,
            frame_sink,
            logger,
            observer,
            renderer,
            store,
            cancelled,
            frame_interval,
        } = self;

        let mut frames = capture.frames();
        let mut processed = 0;

        loop {
            if cancelled.load(Ordering::Relaxed) {
                logger.info(&format!("Stop requested after {processed} frames"));
                break;
            }

            let started = Instant::now();
            let Some(next) = frames.next() else {
                logger.info(&format!("Capture ended after {processed} frames"));
                break;
            };
            let mut frame = next.map_err(SessionError::Capture)?;
            logger.timing("capture", elapsed_ms(started));

            let started = Instant::now();
            let detections = detector
                .detect(&frame)
                .map_err(|source| SessionError::Detection {
                    index: frame.index(),
                    source,
                })?;
            logger.timing("detect", elapsed_ms(started));

            let started = Instant::now();
            let update = store.apply_detections(observer, &detections);
            logger.timing("associate", elapsed_ms(started));
            logger.metric("tracked_faces", update.face_count as f64);
            if update.outcome.created > 0 || update.outcome.removed > 0 {
                log::trace!(
                    "Frame {}: +{} -{} tracks",
                    frame.index(),
                    update.outcome.created,
                    update.outcome.removed
                );
            }

            let started = Instant::now();
            renderer.render(&*store, &mut frame);
            frame_sink
                .write(&frame)
                .map_err(SessionError::FrameSink)?;
            logger.timing("render", elapsed_ms(started));

            logger.frame(frame.index(), update.face_count);
            processed += 1;

            if let Some(pause) = *frame_interval {
                thread::sleep(pause);
            }
        }

        Ok(processed)
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::infrastructure::replay_detector::{DetectionLog, ReplayDetector};
    use crate::rendering::domain::frame_sink::NullFrameSink;
    use crate::reporting::domain::report_sink::FaceCountReport;
    use crate::session::session_logger::NullSessionLogger;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::error::ConfigError;
    use crate::shared::frame::Frame;
    use crate::tracking::infrastructure::shared_track_store::SharedTrackStore;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    const A: BoundingBox = BoundingBox::new(0, 0, 50, 50);
    const A_MOVED: BoundingBox = BoundingBox::new(10, 10, 60, 60);
    const B: BoundingBox = BoundingBox::new(500, 500, 550, 550);

    fn blank_frame(index: usize) -> Frame {
        Frame::new(vec![0u8; 8 * 8 * 3], 8, 8, 3, index)
    }

    struct FakeCapture {
        limit: Option<usize>,
        fail_open: bool,
        releases: Arc<AtomicUsize>,
    }

    impl FakeCapture {
        fn new(limit: Option<usize>) -> (Self, Arc<AtomicUsize>) {
            let releases = Arc::new(AtomicUsize::new(0));
            let capture = Self {
                limit,
                fail_open: false,
                releases: Arc::clone(&releases),
            };
            (capture, releases)
        }
    }

    impl CaptureSource for FakeCapture {
        fn open(&mut self) -> Result<(), BoxError> {
            if self.fail_open {
                return Err("no camera".into());
            }
            Ok(())
        }

        fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, BoxError>> + '_> {
            let limit = self.limit;
            Box::new(
                (0..)
                    .take_while(move |i| limit.map_or(true, |n| *i < n))
                    .map(|i| Ok(blank_frame(i))),
            )
        }

        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FailingDetector {
        fail_at: usize,
    }

    impl FaceDetector for FailingDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, BoxError> {
            if frame.index() == self.fail_at {
                return Err("model crashed".into());
            }
            Ok(vec![A])
        }
    }

    #[derive(Clone, Default)]
    struct RecordingFrameSink {
        written: Arc<Mutex<Vec<usize>>>,
        closed: Arc<AtomicBool>,
    }

    impl FrameSink for RecordingFrameSink {
        fn write(&mut self, frame: &Frame) -> Result<(), BoxError> {
            self.written.lock().unwrap().push(frame.index());
            Ok(())
        }

        fn close(&mut self) -> Result<(), BoxError> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingReportSink {
        reports: Arc<Mutex<Vec<FaceCountReport>>>,
    }

    impl ReportSink for RecordingReportSink {
        fn emit(&mut self, report: &FaceCountReport) -> Result<(), BoxError> {
            self.reports.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    struct FailingReportSink;

    impl ReportSink for FailingReportSink {
        fn emit(&mut self, _report: &FaceCountReport) -> Result<(), BoxError> {
            Err("disk full".into())
        }
    }

    fn replay(frames: Vec<Vec<BoundingBox>>) -> Box<dyn FaceDetector> {
        Box::new(ReplayDetector::new(DetectionLog { frames }))
    }

    fn parts(capture: FakeCapture, detector: Box<dyn FaceDetector>) -> SessionParts {
        SessionParts {
            capture: Box::new(capture),
            detector,
            frame_sink: Box::new(NullFrameSink),
            report_sink: Box::new(RecordingReportSink::default()),
            logger: Box::new(NullSessionLogger),
        }
    }

    fn session(config: SessionConfig) -> TrackingSession<SharedTrackStore> {
        TrackingSession::new(config, SharedTrackStore::new())
    }

    #[test]
    fn test_processes_every_frame_and_publishes_last_count() {
        let (capture, releases) = FakeCapture::new(Some(3));
        let sink = RecordingFrameSink::default();
        let mut parts = parts(capture, replay(vec![vec![A], vec![A, B], vec![A_MOVED, B]]));
        parts.frame_sink = Box::new(sink.clone());
        let session = session(SessionConfig::default());

        let summary = session.run(parts).unwrap();

        assert_eq!(summary.frames, 3);
        assert_eq!(summary.face_count, 2);
        assert_eq!(session.store().snapshot().face_count, 2);
        let boxes: Vec<_> = session.store().snapshot().faces.iter().map(|f| f.bbox()).collect();
        assert_eq!(boxes, vec![A_MOVED, B]);
        assert_eq!(*sink.written.lock().unwrap(), vec![0, 1, 2]);
        assert!(sink.closed.load(Ordering::SeqCst));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_capture_exhaustion_raises_cancellation() {
        let (capture, _releases) = FakeCapture::new(Some(1));
        let session = session(SessionConfig::default());
        session.run(parts(capture, replay(vec![]))).unwrap();
        assert!(session.cancel_handle().load(Ordering::SeqCst));
    }

    #[test]
    fn test_cancelled_before_start_processes_nothing() {
        let (capture, releases) = FakeCapture::new(None);
        let session = session(SessionConfig::default());
        session.cancel_handle().store(true, Ordering::SeqCst);

        let summary = session.run(parts(capture, replay(vec![vec![A]]))).unwrap();

        assert_eq!(summary.frames, 0);
        assert_eq!(summary.face_count, 0);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_external_cancel_stops_endless_capture() {
        let (capture, releases) = FakeCapture::new(None);
        let config = SessionConfig {
            frame_interval_ms: 1,
            ..SessionConfig::default()
        };
        let session = session(config);
        let cancel = session.cancel_handle();

        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            cancel.store(true, Ordering::SeqCst);
        });
        let summary = session.run(parts(capture, replay(vec![vec![A]]))).unwrap();
        stopper.join().unwrap();

        assert!(summary.frames >= 1);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_capture_open_failure() {
        let (mut capture, releases) = FakeCapture::new(Some(3));
        capture.fail_open = true;
        let session = session(SessionConfig::default());

        let err = session.run(parts(capture, replay(vec![]))).unwrap_err();

        assert!(matches!(err, SessionError::Capture(_)));
        assert_eq!(err.to_string(), "capture failed: no camera");
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_threshold_fails_before_capture_opens() {
        let (capture, releases) = FakeCapture::new(None);
        let mut config = SessionConfig::default();
        config.tracker.distance_threshold = 0.0;
        let session = session(config);

        let err = session.run(parts(capture, replay(vec![vec![A]]))).unwrap_err();

        assert!(matches!(
            err,
            SessionError::Config(ConfigError::InvalidThreshold(_))
        ));
        assert_eq!(releases.load(Ordering::SeqCst), 0);
        assert_eq!(session.store().face_count(), 0);
    }

    #[test]
    fn test_detector_failure_names_frame_and_releases_capture() {
        let (capture, releases) = FakeCapture::new(Some(5));
        let session = session(SessionConfig::default());

        let err = session
            .run(parts(capture, Box::new(FailingDetector { fail_at: 2 })))
            .unwrap_err();

        assert!(matches!(err, SessionError::Detection { index: 2, .. }));
        assert_eq!(err.to_string(), "detection failed on frame 2: model crashed");
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        // Frames 0 and 1 were applied before the failure.
        assert_eq!(session.store().face_count(), 1);
    }

    #[test]
    fn test_report_sink_failure_stops_session() {
        let (capture, releases) = FakeCapture::new(None);
        let config = SessionConfig {
            report_interval_ms: 5,
            frame_interval_ms: 1,
            ..SessionConfig::default()
        };
        let session = session(config);
        let mut parts = parts(capture, replay(vec![vec![A]]));
        parts.report_sink = Box::new(FailingReportSink);

        let err = session.run(parts).unwrap_err();

        assert!(matches!(err, SessionError::Report(_)));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reporter_samples_while_frames_run() {
        let (capture, _releases) = FakeCapture::new(Some(40));
        let sink = RecordingReportSink::default();
        let config = SessionConfig {
            device_id: "lobby".into(),
            report_interval_ms: 5,
            frame_interval_ms: 2,
            ..SessionConfig::default()
        };
        let session = session(config);
        let mut parts = parts(capture, replay(vec![vec![A]; 40]));
        parts.report_sink = Box::new(sink.clone());

        let summary = session.run(parts).unwrap();

        let reports = sink.reports.lock().unwrap();
        assert_eq!(reports.len(), summary.reports);
        assert!(!reports.is_empty());
        assert!(reports.iter().all(|r| r.device_id == "lobby" && r.face_count <= 1));
    }

    #[test]
    fn test_frame_error_wins_over_reporter_error() {
        let result = join_activities(
            Ok(Err(SessionError::FrameSink("closed".into()))),
            Ok(Err("disk full".into())),
        );
        assert!(matches!(result, Err(SessionError::FrameSink(_))));
    }

    #[test]
    fn test_panicked_reporter_is_reported() {
        let handle = thread::spawn(|| -> Result<usize, BoxError> { panic!("boom") });
        let result = join_activities(Ok(Ok(3)), handle.join());
        assert!(matches!(
            result,
            Err(SessionError::ThreadPanicked("reporter"))
        ));
    }
}
