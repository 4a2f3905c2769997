//! Repository port traits for story storage and neighbouring collaborators.

use async_trait::async_trait;
use branchtale_domain::{NodeId, SceneId, SceneInfo, StoryRecord};
use chrono::{DateTime, Utc};

use super::error::RepoError;
use super::types::ConversationEntry;

// =============================================================================
// Story Record Store
// =============================================================================

/// Persists one [`StoryRecord`] per scene as an opaque unit.
///
/// `save` must be all-or-nothing: concurrent `load`s observe either the
/// previous record or the new one, never a partial write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoryRecordRepo: Send + Sync {
    async fn load(&self, scene_id: SceneId) -> Result<Option<StoryRecord>, RepoError>;
    async fn save(&self, record: &StoryRecord) -> Result<(), RepoError>;
    /// Deleting a missing record is not an error.
    async fn delete(&self, scene_id: SceneId) -> Result<(), RepoError>;
}

// =============================================================================
// Scene metadata
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SceneCatalog: Send + Sync {
    async fn get(&self, scene_id: SceneId) -> Result<Option<SceneInfo>, RepoError>;
}

// =============================================================================
// Conversation transcript
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationLog: Send + Sync {
    async fn append(&self, scene_id: SceneId, entry: ConversationEntry) -> Result<(), RepoError>;

    /// Drop entries tied to `node_ids` or recorded after `cutoff`.
    /// Returns the number of removed entries.
    async fn remove_entries_after(
        &self,
        scene_id: SceneId,
        node_ids: &[NodeId],
        cutoff: DateTime<Utc>,
    ) -> Result<usize, RepoError>;
}
