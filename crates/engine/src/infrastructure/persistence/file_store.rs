//! JSON file story record store.
//!
//! Each scene lives in `<data_dir>/<scene_id>.json`. Saves serialize to a
//! uniquely named temp file in the same directory and then rename it over the
//! target, so lock-free readers see either the old or the new document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use branchtale_domain::{SceneId, StoryRecord};
use uuid::Uuid;

use crate::infrastructure::ports::{RepoError, StoryRecordRepo};

pub struct FileStoryStore {
    data_dir: PathBuf,
}

impl FileStoryStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn record_path(&self, scene_id: SceneId) -> PathBuf {
        self.data_dir.join(format!("{}.json", scene_id))
    }

    fn temp_path(&self, scene_id: SceneId) -> PathBuf {
        self.data_dir
            .join(format!(".{}.{}.tmp", scene_id, Uuid::new_v4().simple()))
    }
}

#[async_trait]
impl StoryRecordRepo for FileStoryStore {
    async fn load(&self, scene_id: SceneId) -> Result<Option<StoryRecord>, RepoError> {
        let path = self.record_path(scene_id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepoError::storage("load", e)),
        };

        let record = serde_json::from_str(&raw).map_err(|e| {
            tracing::error!(
                scene_id = %scene_id,
                path = %path.display(),
                error = %e,
                "Corrupt story record"
            );
            RepoError::serialization(e)
        })?;
        Ok(Some(record))
    }

    async fn save(&self, record: &StoryRecord) -> Result<(), RepoError> {
        let scene_id = record.scene_id();
        let serialized = serde_json::to_vec_pretty(record).map_err(RepoError::serialization)?;

        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| RepoError::storage("save", e))?;

        let temp = self.temp_path(scene_id);
        if let Err(e) = tokio::fs::write(&temp, &serialized).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(RepoError::storage("save", e));
        }
        if let Err(e) = tokio::fs::rename(&temp, self.record_path(scene_id)).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(RepoError::storage("save", e));
        }

        tracing::debug!(scene_id = %scene_id, bytes = serialized.len(), "Story record saved");
        Ok(())
    }

    async fn delete(&self, scene_id: SceneId) -> Result<(), RepoError> {
        match tokio::fs::remove_file(self.record_path(scene_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RepoError::storage("delete", e)),
        }
    }
}
