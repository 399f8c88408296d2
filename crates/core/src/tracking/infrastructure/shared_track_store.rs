use std::sync::{Arc, Mutex, MutexGuard};

use crate::tracking::domain::track_store::{TrackState, TrackStore};

/// [`TrackStore`] behind one `Arc<Mutex<_>>`.
///
/// Clones share the same table. The frame loop, the reporter and the
/// renderer all contend on this single lock.
#[derive(Clone, Default)]
pub struct SharedTrackStore {
    inner: Arc<Mutex<TrackState>>,
}

impl SharedTrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TrackState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // A holder panicked mid-pass; the state is still a valid
                // table, so keep serving it.
                log::warn!("Track store lock was poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl TrackStore for SharedTrackStore {
    fn with_exclusive_access<R>(&self, f: impl FnOnce(&mut TrackState) -> R) -> R {
        let mut guard = self.lock();
        f(&mut *guard)
    }
}
