use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

/// Detector output recorded ahead of time, one entry per frame index.
///
/// ```json
/// { "frames": [ [[0, 0, 50, 50]], [], [[10, 10, 60, 60], [500, 500, 550, 550]] ] }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionLog {
    pub frames: Vec<Vec<BoundingBox>>,
}

/// Serves recorded detections by frame index instead of running a model.
///
/// Frames past the end of the log have no faces.
pub struct ReplayDetector {
    log: DetectionLog,
}

impl ReplayDetector {
    pub fn new(log: DetectionLog) -> Self {
        Self { log }
    }

    pub fn from_json(json: &str) -> Result<Self, BoxError> {
        let log: DetectionLog = serde_json::from_str(json)?;
        Ok(Self::new(log))
    }

    pub fn from_path(path: &Path) -> Result<Self, BoxError> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("failed to read detections {}: {e}", path.display()))?;
        let detector = Self::from_json(&json)
            .map_err(|e| format!("failed to parse detections {}: {e}", path.display()))?;
        log::info!(
            "Loaded {} recorded frames of detections from {}",
            detector.log.frames.len(),
            path.display()
        );
        Ok(detector)
    }

    pub fn recorded_frames(&self) -> usize {
        self.log.frames.len()
    }
}

impl FaceDetector for ReplayDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, BoxError> {
        Ok(self
            .log
            .frames
            .get(frame.index())
            .cloned()
            .unwrap_or_default())
    }
}
