use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::reporting::domain::report_sink::{FaceCountReport, ReportSink};
use crate::shared::error::BoxError;

/// Appends one text line per sample to any writer, flushing after each.
pub struct WriterReportSink<W: Write + Send> {
    writer: W,
}

pub type FileReportSink = WriterReportSink<File>;

impl<W: Write + Send> WriterReportSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl FileReportSink {
    /// Opens `path` for appending, creating it if needed. Existing lines
    /// are kept.
    pub fn append_to(path: &Path) -> Result<Self, BoxError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| format!("cannot open report file {}: {e}", path.display()))?;
        Ok(Self::new(file))
    }
}

impl<W: Write + Send> ReportSink for WriterReportSink<W> {
    fn emit(&mut self, report: &FaceCountReport) -> Result<(), BoxError> {
        writeln!(self.writer, "{report}")?;
        self.writer.flush()?;
        Ok(())
    }
}
