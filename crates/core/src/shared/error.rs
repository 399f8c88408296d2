use std::path::PathBuf;

use thiserror::Error;

/// Error type crossing collaborator seams (capture, detector, sinks).
///
/// `Send + Sync` so failures can travel from worker threads to the joiner.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("distance threshold must be a positive finite number, got {0}")]
    InvalidThreshold(f64),
    #[error("report interval must be at least 1 ms")]
    InvalidReportInterval,
    #[error("device id must not be empty")]
    EmptyDeviceId,
}
