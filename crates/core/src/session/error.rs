use thiserror::Error;

use crate::shared::error::{BoxError, ConfigError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session config: {0}")]
    Config(#[from] ConfigError),
    #[error("capture failed: {0}")]
    Capture(#[source] BoxError),
    #[error("detection failed on frame {index}: {source}")]
    Detection {
        index: usize,
        #[source]
        source: BoxError,
    },
    #[error("frame sink failed: {0}")]
    FrameSink(#[source] BoxError),
    #[error("report sink failed: {0}")]
    Report(#[source] BoxError),
    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
}
