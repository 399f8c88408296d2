//! Frame-to-frame face association.
//!
//! Each frame's detections are matched against the track table with a
//! single rule: a detection continues a track when their centroids are
//! closer than the distance threshold. What happens to misses depends on
//! whether the detection count went up, down, or stayed the same compared
//! to the count published after the previous frame.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::shared::bounding_box::BoundingBox;

use crate::shared::error::ConfigError;

use super::tracked_face::{TrackId, TrackTable, TrackedFace};
use super::tracker_config::{AppendPolicy, PrunePolicy, TrackerConfig};

/// Tally of what one call to [`FrameObserver::update`] did to the table.
///
/// `updated` counts box assignments, so a track refreshed by two
/// detections in the same frame counts twice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssociationOutcome {
    pub updated: usize,
    pub created: usize,
    pub removed: usize,
    pub cleared: bool,
}

pub struct FrameObserver {
    config: TrackerConfig,
}

impl FrameObserver {
    /// Rejects configs whose threshold no distance can fall below.
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Applies one frame of detections to `tracks`.
    ///
    /// `previous_count` is the face count published after the previous
    /// frame, not the live table length. The caller publishes
    /// `tracks.len()` as the next `previous_count` once this returns.
    pub fn update(
        &self,
        detections: &[BoundingBox],
        previous_count: usize,
        tracks: &mut TrackTable,
    ) -> AssociationOutcome {
        let mut outcome = AssociationOutcome::default();

        if detections.is_empty() {
            if self.config.clear_on_empty {
                outcome.removed = tracks.len();
                outcome.cleared = true;
                tracks.clear();
            }
            return outcome;
        }

        match detections.len().cmp(&previous_count) {
            Ordering::Equal => {
                for det in detections {
                    self.refresh(det, tracks, &mut outcome);
                }
            }
            Ordering::Greater if previous_count == 0 => {
                for det in detections {
                    tracks.push(det);
                    outcome.created += 1;
                }
            }
            Ordering::Greater => match self.config.append_policy {
                AppendPolicy::PerUnmatchedTrack => {
                    for det in detections {
                        self.refresh_or_append_per_miss(det, tracks, &mut outcome);
                    }
                }
                AppendPolicy::OncePerDetection => {
                    for det in detections {
                        if !self.refresh(det, tracks, &mut outcome) {
                            tracks.push(det);
                            outcome.created += 1;
                        }
                    }
                }
            },
            Ordering::Less => match self.config.prune_policy {
                PrunePolicy::InPlace => {
                    for det in detections {
                        self.refresh_or_remove_in_place(det, tracks, &mut outcome);
                    }
                }
                PrunePolicy::Reconciled => {
                    self.refresh_and_reconcile(detections, tracks, &mut outcome)
                }
            },
        }

        outcome
    }

    fn is_match(&self, face: &TrackedFace, det_centroid: (f64, f64)) -> bool {
        let (tx, ty) = self.config.centroid_rule.centroid(&face.bbox());
        let (dx, dy) = det_centroid;
        let distance = ((tx - dx).powi(2) + (ty - dy).powi(2)).sqrt();
        distance < self.config.distance_threshold
    }

    /// Assigns `det` to every track within range. Returns whether any matched.
    fn refresh(
        &self,
        det: &BoundingBox,
        tracks: &mut TrackTable,
        outcome: &mut AssociationOutcome,
    ) -> bool {
        let centroid = self.config.centroid_rule.centroid(det);
        let mut matched = false;
        for face in tracks.faces_mut() {
            if self.is_match(face, centroid) {
                face.assign(det);
                outcome.updated += 1;
                matched = true;
            }
        }
        matched
    }

    // The table length is re-read every step: tracks appended during the
    // walk are visited too, and match `det` at distance zero.
    fn refresh_or_append_per_miss(
        &self,
        det: &BoundingBox,
        tracks: &mut TrackTable,
        outcome: &mut AssociationOutcome,
    ) {
        let centroid = self.config.centroid_rule.centroid(det);
        let mut index = 0;
        while let Some(face) = tracks.get(index) {
            if self.is_match(face, centroid) {
                if let Some(face) = tracks.get_mut(index) {
                    face.assign(det);
                }
                outcome.updated += 1;
            } else {
                tracks.push(det);
                outcome.created += 1;
            }
            index += 1;
        }
    }

    // The cursor advances after a removal, so the track that slides into
    // the freed slot is skipped for this detection.
    fn refresh_or_remove_in_place(
        &self,
        det: &BoundingBox,
        tracks: &mut TrackTable,
        outcome: &mut AssociationOutcome,
    ) {
        let centroid = self.config.centroid_rule.centroid(det);
        let mut index = 0;
        while let Some(face) = tracks.get(index) {
            if self.is_match(face, centroid) {
                if let Some(face) = tracks.get_mut(index) {
                    face.assign(det);
                }
                outcome.updated += 1;
            } else {
                let dropped = tracks.remove(index);
                log::trace!("Dropped track {} at position {index}", dropped.id);
                outcome.removed += 1;
            }
            index += 1;
        }
    }

    fn refresh_and_reconcile(
        &self,
        detections: &[BoundingBox],
        tracks: &mut TrackTable,
        outcome: &mut AssociationOutcome,
    ) {
        let mut seen: HashSet<TrackId> = HashSet::new();
        for det in detections {
            let centroid = self.config.centroid_rule.centroid(det);
            for face in tracks.faces_mut() {
                if self.is_match(face, centroid) {
                    face.assign(det);
                    outcome.updated += 1;
                    seen.insert(face.id);
                }
            }
        }

        let before = tracks.len();
        tracks.retain(|face| seen.contains(&face.id));
        outcome.removed += before - tracks.len();
    }
}
