use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

/// Source of camera frames.
///
/// `frames` may block until the next frame is available. A failed frame
/// ends the session; sources are not expected to retry.
pub trait CaptureSource: Send {
    /// Acquires the device (or file set) backing this source.
    fn open(&mut self) -> Result<(), BoxError>;

    /// Returns an iterator over frames in capture order.
    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, BoxError>> + '_>;

    /// Releases the device. Safe to call more than once.
    fn release(&mut self);
}
