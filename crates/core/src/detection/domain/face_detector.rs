use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

/// Opaque face detector.
///
/// Returns the boxes found in one frame. Order carries no meaning and
/// boxes have no identity across calls; that is the tracker's job.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, BoxError>;
}
