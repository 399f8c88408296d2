use crate::reporting::domain::report_sink::{FaceCountReport, ReportSink};
use crate::shared::error::BoxError;

/// Emits each sample as an `info` log record under the `face_count` target.
pub struct LogReportSink;

impl ReportSink for LogReportSink {
    fn emit(&mut self, report: &FaceCountReport) -> Result<(), BoxError> {
        log::info!(target: "face_count", "{report}");
        Ok(())
    }
}
