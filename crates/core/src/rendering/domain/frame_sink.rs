use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

/// Destination for annotated frames (a display, a stream, files).
pub trait FrameSink: Send {
    fn write(&mut self, frame: &Frame) -> Result<(), BoxError>;

    /// Flushes and releases the destination. Default: no-op.
    fn close(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Discards every frame. Used when nothing consumes the overlay output.
pub struct NullFrameSink;

impl FrameSink for NullFrameSink {
    fn write(&mut self, _frame: &Frame) -> Result<(), BoxError> {
        Ok(())
    }
}
