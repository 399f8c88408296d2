use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_DEVICE_ID, DEFAULT_REPORT_INTERVAL_MS,
};
use crate::shared::error::ConfigError;
use crate::tracking::domain::tracker_config::TrackerConfig;

/// Settings for one tracking session. Fixed once the session starts.
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```json
/// { "device_id": "lobby-cam", "tracker": { "distance_threshold": 500.0 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Opaque label copied into every face-count report.
    pub device_id: String,
    pub report_interval_ms: u64,
    /// Pause after each frame; 0 processes frames as fast as they arrive.
    pub frame_interval_ms: u64,
    /// Mirror frames left-to-right before detection.
    pub mirror: bool,
    pub tracker: TrackerConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device_id: DEFAULT_DEVICE_ID.to_string(),
            report_interval_ms: DEFAULT_REPORT_INTERVAL_MS,
            frame_interval_ms: 0,
            mirror: true,
            tracker: TrackerConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the per-user config file if there is one, defaults otherwise.
    /// A file that exists but does not parse is still an error.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => {
                log::debug!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracker.validate()?;
        if self.report_interval_ms == 0 {
            return Err(ConfigError::InvalidReportInterval);
        }
        if self.device_id.trim().is_empty() {
            return Err(ConfigError::EmptyDeviceId);
        }
        Ok(())
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    pub fn frame_interval(&self) -> Option<Duration> {
        (self.frame_interval_ms > 0).then(|| Duration::from_millis(self.frame_interval_ms))
    }
}
