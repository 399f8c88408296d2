use crate::shared::bounding_box::BoundingBox;

use super::frame_observer::{AssociationOutcome, FrameObserver};
use super::tracked_face::{TrackTable, TrackedFace};

/// Everything guarded by the store's lock: the table and the face count
/// published after the last association pass.
#[derive(Clone, Debug, Default)]
pub struct TrackState {
    pub table: TrackTable,
    pub face_count: usize,
}

/// Copy of [`TrackState`] taken under the lock. `face_count` always
/// describes the same pass as `faces`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackSnapshot {
    pub faces: Vec<TrackedFace>,
    pub face_count: usize,
}

/// Result of one writer pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameUpdate {
    pub outcome: AssociationOutcome,
    pub face_count: usize,
}

/// Shared home of the track table.
///
/// Every reader and the single writer go through
/// [`with_exclusive_access`](TrackStore::with_exclusive_access), so a
/// reader sees either the state before a pass or after it, never a mix.
pub trait TrackStore: Send + Sync {
    /// Runs `f` while holding the store's only lock. The lock is released
    /// when `f` returns or unwinds.
    fn with_exclusive_access<R>(&self, f: impl FnOnce(&mut TrackState) -> R) -> R;

    /// Associates one frame of detections and publishes the new count
    /// before the lock is released.
    fn apply_detections(
        &self,
        observer: &FrameObserver,
        detections: &[BoundingBox],
    ) -> FrameUpdate {
        self.with_exclusive_access(|state| {
            let outcome = observer.update(detections, state.face_count, &mut state.table);
            state.face_count = state.table.len();
            FrameUpdate {
                outcome,
                face_count: state.face_count,
            }
        })
    }

    fn snapshot(&self) -> TrackSnapshot {
        self.with_exclusive_access(|state| TrackSnapshot {
            faces: state.table.faces().to_vec(),
            face_count: state.face_count,
        })
    }

    fn face_count(&self) -> usize {
        self.with_exclusive_access(|state| state.face_count)
    }
}
