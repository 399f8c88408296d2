use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::DEFAULT_DISTANCE_THRESHOLD;
use crate::shared::error::ConfigError;

/// Point used to compare a detection with a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CentroidRule {
    /// [`BoundingBox::biased_midpoint`].
    #[default]
    Biased,
    /// [`BoundingBox::geometric_midpoint`].
    Geometric,
}

impl CentroidRule {
    pub fn centroid(self, bbox: &BoundingBox) -> (f64, f64) {
        match self {
            CentroidRule::Biased => bbox.biased_midpoint(),
            CentroidRule::Geometric => bbox.geometric_midpoint(),
        }
    }
}

/// What happens to a detection that misses an existing track while the
/// frame has more detections than the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppendPolicy {
    /// Append the detection once for every track it misses, walking the
    /// live table (tracks appended earlier in the same frame included).
    /// A single new face can therefore produce several tracks.
    #[default]
    PerUnmatchedTrack,
    /// Append the detection once, and only if it matched no track.
    OncePerDetection,
}

/// How tracks are dropped while the frame has fewer detections than the
/// previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrunePolicy {
    /// Remove a track by position the moment a detection misses it, while
    /// walking the same table. The track shifted into the freed slot is not
    /// examined for that detection, so some stale tracks survive the frame
    /// and a track near a later detection can be removed by an earlier one.
    InPlace,
    /// Mark tracks by id that were within range of any detection and remove
    /// the unmarked ones after all detections are processed.
    #[default]
    Reconciled,
}

impl CentroidRule {
    pub fn as_str(self) -> &'static str {
        match self {
            CentroidRule::Biased => "biased",
            CentroidRule::Geometric => "geometric",
        }
    }
}

impl AppendPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            AppendPolicy::PerUnmatchedTrack => "per_unmatched_track",
            AppendPolicy::OncePerDetection => "once_per_detection",
        }
    }
}

impl PrunePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            PrunePolicy::InPlace => "in_place",
            PrunePolicy::Reconciled => "reconciled",
        }
    }
}

impl fmt::Display for CentroidRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AppendPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PrunePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn unknown_choice(choices: &[&str], got: &str) -> String {
    format!("expected one of: {}, got '{got}'", choices.join(", "))
}

impl FromStr for CentroidRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "biased" => Ok(CentroidRule::Biased),
            "geometric" => Ok(CentroidRule::Geometric),
            other => Err(unknown_choice(&["biased", "geometric"], other)),
        }
    }
}

impl FromStr for AppendPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per_unmatched_track" => Ok(AppendPolicy::PerUnmatchedTrack),
            "once_per_detection" => Ok(AppendPolicy::OncePerDetection),
            other => Err(unknown_choice(
                &["per_unmatched_track", "once_per_detection"],
                other,
            )),
        }
    }
}

impl FromStr for PrunePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_place" => Ok(PrunePolicy::InPlace),
            "reconciled" => Ok(PrunePolicy::Reconciled),
            other => Err(unknown_choice(&["in_place", "reconciled"], other)),
        }
    }
}

/// Association parameters, fixed for the lifetime of a tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub distance_threshold: f64,
    pub centroid_rule: CentroidRule,
    pub append_policy: AppendPolicy,
    pub prune_policy: PrunePolicy,
    /// Drop every track on a frame with no detections instead of keeping
    /// the table as it was.
    pub clear_on_empty: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
            centroid_rule: CentroidRule::default(),
            append_policy: AppendPolicy::default(),
            prune_policy: PrunePolicy::default(),
            clear_on_empty: true,
        }
    }
}

impl TrackerConfig {
    pub fn with_threshold(distance_threshold: f64) -> Self {
        Self {
            distance_threshold,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.distance_threshold.is_finite() || self.distance_threshold <= 0.0 {
            return Err(ConfigError::InvalidThreshold(self.distance_threshold));
        }
        Ok(())
    }
}
