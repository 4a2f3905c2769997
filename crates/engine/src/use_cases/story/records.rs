//! Locked access to story records.
//!
//! Every mutation follows the same shape: take the scene lock, load the
//! record, mutate a clone, save. Any error before the save leaves the stored
//! record untouched. Reads skip the lock and rely on atomic saves.

use std::sync::Arc;

use branchtale_domain::{DomainError, NodeId, SceneId, StoryRecord};
use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;

use super::StoryError;
use crate::infrastructure::ports::{ConversationEntry, ConversationLog, StoryRecordRepo};
use crate::stores::SceneLocks;

pub struct StoryRecords {
    repo: Arc<dyn StoryRecordRepo>,
    locks: Arc<SceneLocks>,
    conversation: Arc<dyn ConversationLog>,
}

impl StoryRecords {
    pub fn new(
        repo: Arc<dyn StoryRecordRepo>,
        locks: Arc<SceneLocks>,
        conversation: Arc<dyn ConversationLog>,
    ) -> Self {
        Self {
            repo,
            locks,
            conversation,
        }
    }

    pub async fn lock(&self, scene_id: SceneId) -> OwnedMutexGuard<()> {
        self.locks.acquire(scene_id).await
    }

    pub async fn load(&self, scene_id: SceneId) -> Result<Option<StoryRecord>, StoryError> {
        Ok(self.repo.load(scene_id).await?)
    }

    /// Load a record that must exist.
    pub async fn require(&self, scene_id: SceneId) -> Result<StoryRecord, StoryError> {
        self.load(scene_id)
            .await?
            .ok_or_else(|| StoryError::not_found("StoryRecord", scene_id))
    }

    /// Stamp and persist. Callers must hold the scene lock.
    pub async fn save(
        &self,
        record: &mut StoryRecord,
        now: DateTime<Utc>,
    ) -> Result<(), StoryError> {
        record.touch(now);
        self.repo.save(record).await?;
        Ok(())
    }

    pub async fn delete(&self, scene_id: SceneId) -> Result<(), StoryError> {
        let _guard = self.lock(scene_id).await;
        self.repo.delete(scene_id).await?;
        drop(_guard);
        self.locks.forget(scene_id);
        Ok(())
    }

    /// Run a synchronous mutation under the scene lock.
    ///
    /// `f` receives a copy of the stored record; the copy is saved only if
    /// `f` succeeds.
    pub async fn mutate<T, F>(
        &self,
        scene_id: SceneId,
        now: DateTime<Utc>,
        f: F,
    ) -> Result<T, StoryError>
    where
        F: FnOnce(&mut StoryRecord) -> Result<T, DomainError> + Send,
        T: Send,
    {
        let _guard = self.lock(scene_id).await;
        let mut working = self.require(scene_id).await?;
        let out = f(&mut working)?;
        self.save(&mut working, now).await?;
        Ok(out)
    }

    /// Append to the transcript. Failures are logged, never propagated.
    pub async fn record_conversation(&self, scene_id: SceneId, entries: Vec<ConversationEntry>) {
        for entry in entries {
            if let Err(e) = self.conversation.append(scene_id, entry).await {
                tracing::warn!(
                    scene_id = %scene_id,
                    error = %e,
                    "Failed to append conversation entry"
                );
            }
        }
    }

    /// Drop transcript entries for `discarded` nodes or recorded after
    /// `cutoff`. Failures are logged, never propagated.
    pub async fn prune_conversation(
        &self,
        scene_id: SceneId,
        discarded: &[NodeId],
        cutoff: DateTime<Utc>,
    ) {
        match self
            .conversation
            .remove_entries_after(scene_id, discarded, cutoff)
            .await
        {
            Ok(removed) => {
                tracing::debug!(scene_id = %scene_id, removed, "Pruned conversation after rewind")
            }
            Err(e) => tracing::warn!(
                scene_id = %scene_id,
                error = %e,
                "Conversation pruning failed after rewind"
            ),
        }
    }
}
