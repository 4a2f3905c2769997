//! Read-side story use cases and scene deletion.
//!
//! Reads never take the scene lock; saves are atomic so a reader always sees
//! a whole record.

use std::sync::Arc;

use branchtale_domain::{
    build_branch_tree, sort_choices_for_display, BranchView, Choice, SceneId, StoryRecord,
};
use serde::Serialize;

use super::records::StoryRecords;
use super::StoryError;

/// A record plus its branch view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryData {
    pub record: StoryRecord,
    pub view: BranchView,
}

pub struct GetStoryData {
    records: Arc<StoryRecords>,
}

impl GetStoryData {
    pub fn new(records: Arc<StoryRecords>) -> Self {
        Self { records }
    }

    pub async fn execute(&self, scene_id: SceneId) -> Result<StoryData, StoryError> {
        let record = self.records.require(scene_id).await?;
        let orphans = record.orphan_ids();
        if !orphans.is_empty() {
            tracing::warn!(
                scene_id = %scene_id,
                count = orphans.len(),
                "Story record has orphaned nodes"
            );
        }
        let view = build_branch_tree(record.nodes());
        Ok(StoryData { record, view })
    }
}

/// Choices still open on the current leaf, in display order.
pub struct GetAvailableChoices {
    records: Arc<StoryRecords>,
}

impl GetAvailableChoices {
    pub fn new(records: Arc<StoryRecords>) -> Self {
        Self { records }
    }

    pub async fn execute(&self, scene_id: SceneId) -> Result<Vec<Choice>, StoryError> {
        let record = self.records.require(scene_id).await?;
        let Some(leaf) = record.current_leaf() else {
            return Ok(Vec::new());
        };
        if leaf.has_selection() {
            return Ok(Vec::new());
        }
        let mut choices = leaf.choices.clone();
        sort_choices_for_display(&mut choices);
        Ok(choices)
    }
}

/// Cascade hook for scene deletion. Deleting a missing record succeeds.
pub struct DeleteStory {
    records: Arc<StoryRecords>,
}

impl DeleteStory {
    pub fn new(records: Arc<StoryRecords>) -> Self {
        Self { records }
    }

    pub async fn execute(&self, scene_id: SceneId) -> Result<(), StoryError> {
        self.records.delete(scene_id).await?;
        tracing::info!(scene_id = %scene_id, "Story deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{Harness, ScriptedLlm};
    use super::*;
    use branchtale_domain::GenerationPreferences;

    #[tokio::test]
    async fn story_data_includes_branch_view() {
        let harness = Harness::new(ScriptedLlm::new());
        let seeded = harness.seeded().await;

        let data = harness.story.get_story.execute(seeded.scene_id()).await.unwrap();

        assert_eq!(data.record, seeded);
        assert_eq!(data.view.roots.len(), 1);
        assert_eq!(data.view.anchor, Some(seeded.nodes()[0].id));
    }

    #[tokio::test]
    async fn missing_story_is_not_found() {
        let harness = Harness::new(ScriptedLlm::new());
        let err = harness
            .story
            .get_story
            .execute(SceneId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoryError::NotFound { entity: "StoryRecord", .. }));
    }

    #[tokio::test]
    async fn available_choices_follow_the_leaf() {
        let harness = Harness::new(ScriptedLlm::new().reply(
            r#"{"content": "Two doors.", "choices": [
                {"text": "Left", "impact": 1}, {"text": "Right", "impact": 4}]}"#,
        ));
        let seeded = harness.seeded().await;
        let scene_id = seeded.scene_id();
        let root = &seeded.nodes()[0];

        let choices = harness.story.available_choices.execute(scene_id).await.unwrap();
        let texts: Vec<_> = choices.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Enter the nave", "Circle the cloister"]);

        harness
            .story
            .choose
            .execute(scene_id, root.id, root.choices[0].id, &GenerationPreferences::default())
            .await
            .unwrap();

        let choices = harness.story.available_choices.execute(scene_id).await.unwrap();
        let texts: Vec<_> = choices.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Left", "Right"]);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let harness = Harness::new(ScriptedLlm::new());
        let scene_id = harness.seeded().await.scene_id();

        harness.story.delete.execute(scene_id).await.unwrap();
        harness.story.delete.execute(scene_id).await.unwrap();
        assert_eq!(harness.store.len().await, 0);
    }
}
