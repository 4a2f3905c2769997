//! In-memory adapters.
//!
//! Data lives in a `HashMap` behind an async `RwLock` and is lost on drop.
//! Records are cloned in and out, so callers never share a live reference.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use branchtale_domain::{NodeId, SceneId, SceneInfo, StoryRecord};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::infrastructure::ports::{
    ConversationEntry, ConversationLog, RepoError, SceneCatalog, StoryRecordRepo,
};

// =============================================================================
// Story records
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct InMemoryStoryStore {
    records: Arc<RwLock<HashMap<SceneId, StoryRecord>>>,
}

impl InMemoryStoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl StoryRecordRepo for InMemoryStoryStore {
    async fn load(&self, scene_id: SceneId) -> Result<Option<StoryRecord>, RepoError> {
        Ok(self.records.read().await.get(&scene_id).cloned())
    }

    async fn save(&self, record: &StoryRecord) -> Result<(), RepoError> {
        self.records
            .write()
            .await
            .insert(record.scene_id(), record.clone());
        Ok(())
    }

    async fn delete(&self, scene_id: SceneId) -> Result<(), RepoError> {
        self.records.write().await.remove(&scene_id);
        Ok(())
    }
}

// =============================================================================
// Scene catalog
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct InMemorySceneCatalog {
    scenes: Arc<RwLock<HashMap<SceneId, SceneInfo>>>,
}

impl InMemorySceneCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, scene: SceneInfo) {
        self.scenes.write().await.insert(scene.id, scene);
    }
}

#[async_trait]
impl SceneCatalog for InMemorySceneCatalog {
    async fn get(&self, scene_id: SceneId) -> Result<Option<SceneInfo>, RepoError> {
        Ok(self.scenes.read().await.get(&scene_id).cloned())
    }
}

// =============================================================================
// Conversation transcript
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationLog {
    entries: Arc<RwLock<HashMap<SceneId, Vec<ConversationEntry>>>>,
}

impl InMemoryConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self, scene_id: SceneId) -> Vec<ConversationEntry> {
        self.entries
            .read()
            .await
            .get(&scene_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ConversationLog for InMemoryConversationLog {
    async fn append(&self, scene_id: SceneId, entry: ConversationEntry) -> Result<(), RepoError> {
        self.entries
            .write()
            .await
            .entry(scene_id)
            .or_default()
            .push(entry);
        Ok(())
    }

    async fn remove_entries_after(
        &self,
        scene_id: SceneId,
        node_ids: &[NodeId],
        cutoff: DateTime<Utc>,
    ) -> Result<usize, RepoError> {
        let mut guard = self.entries.write().await;
        let Some(entries) = guard.get_mut(&scene_id) else {
            return Ok(0);
        };

        let before = entries.len();
        entries.retain(|entry| {
            let tied_to_discarded = entry
                .node_id
                .map(|id| node_ids.contains(&id))
                .unwrap_or(false);
            !tied_to_discarded && entry.recorded_at <= cutoff
        });
        Ok(before - entries.len())
    }
}
