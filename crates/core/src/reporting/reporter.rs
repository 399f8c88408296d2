use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use crossbeam_channel::Receiver;

use crate::reporting::domain::report_sink::{FaceCountReport, ReportSink};
use crate::shared::error::BoxError;
use crate::tracking::domain::track_store::TrackStore;

/// Samples the published face count and hands it to a sink, tagged with
/// the device id.
pub struct FaceCountReporter<S: TrackStore> {
    device_id: String,
    store: S,
    sink: Box<dyn ReportSink>,
}

impl<S: TrackStore> FaceCountReporter<S> {
    pub fn new(device_id: impl Into<String>, store: S, sink: Box<dyn ReportSink>) -> Self {
        Self {
            device_id: device_id.into(),
            store,
            sink,
        }
    }

    pub fn sample(&self) -> FaceCountReport {
        FaceCountReport::new(Utc::now(), self.device_id.clone(), self.store.face_count())
    }

    pub fn report(&mut self) -> Result<FaceCountReport, BoxError> {
        let report = self.sample();
        self.sink.emit(&report)?;
        Ok(report)
    }

    /// Reports once per `interval` until `shutdown` disconnects or
    /// `cancelled` is raised. Returns the number of reports emitted.
    pub fn run(
        &mut self,
        interval: Duration,
        cancelled: &AtomicBool,
        shutdown: &Receiver<()>,
    ) -> Result<usize, BoxError> {
        let ticker = crossbeam_channel::tick(interval);
        let mut emitted = 0;

        loop {
            let ticked = crossbeam_channel::select! {
                recv(ticker) -> _ => true,
                recv(shutdown) -> _ => false,
            };
            if !ticked || cancelled.load(Ordering::Relaxed) {
                break;
            }
            self.report()?;
            emitted += 1;
        }

        log::debug!("Reporter for {} stopped after {emitted} reports", self.device_id);
        Ok(emitted)
    }
}
