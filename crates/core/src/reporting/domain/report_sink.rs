use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::shared::error::BoxError;

/// One sample of how many faces a device currently tracks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FaceCountReport {
    pub timestamp: DateTime<Utc>,
    pub device_id: String,
    pub face_count: usize,
}

impl FaceCountReport {
    pub fn new(timestamp: DateTime<Utc>, device_id: impl Into<String>, face_count: usize) -> Self {
        Self {
            timestamp,
            device_id: device_id.into(),
            face_count,
        }
    }
}

/// `timestamp,device_id,face_count` with an RFC 3339 UTC timestamp.
impl fmt::Display for FaceCountReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.device_id,
            self.face_count
        )
    }
}

/// Append-only consumer of face-count samples. No acknowledgement.
pub trait ReportSink: Send {
    fn emit(&mut self, report: &FaceCountReport) -> Result<(), BoxError>;
}
