//! Per-scene write locks.
//!
//! Lazily creates one async mutex per scene so mutations on the same scene are
//! serialized while unrelated scenes stay fully concurrent. Guards are held
//! across the whole load -> generate -> persist sequence.

use std::sync::Arc;

use branchtale_domain::SceneId;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-scene exclusive locks.
#[derive(Default)]
pub struct SceneLocks {
    inner: DashMap<SceneId, Arc<Mutex<()>>>,
}

impl SceneLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `scene_id`.
    pub async fn acquire(&self, scene_id: SceneId) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the DashMap shard lock is released before awaiting
        let lock = self
            .inner
            .entry(scene_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop the lock entry for a deleted scene if nobody holds or awaits it.
    pub fn forget(&self, scene_id: SceneId) {
        self.inner
            .remove_if(&scene_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
