//! Initialize story use case.
//!
//! Creates the first story record for a scene from its catalog entry. The
//! opening is generated; if generation fails the scene's authored description
//! becomes the root node so a story can always be started.

use std::sync::Arc;

use branchtale_domain::{
    ContentSource, GenerationPreferences, NodeType, SceneId, SceneInfo, StoryNode, StoryRecord,
};
use chrono::{DateTime, Utc};

use super::generation::{build_choices, OpeningPayload, StoryGenerator};
use super::records::StoryRecords;
use super::StoryError;
use crate::infrastructure::ports::{ClockPort, ConversationEntry, SceneCatalog};

pub struct InitializeStory {
    records: Arc<StoryRecords>,
    scenes: Arc<dyn SceneCatalog>,
    generator: Arc<StoryGenerator>,
    clock: Arc<dyn ClockPort>,
}

impl InitializeStory {
    pub fn new(
        records: Arc<StoryRecords>,
        scenes: Arc<dyn SceneCatalog>,
        generator: Arc<StoryGenerator>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            records,
            scenes,
            generator,
            clock,
        }
    }

    /// Create and persist the record for `scene_id`.
    ///
    /// Fails with `AlreadyExists` if the scene already has one.
    pub async fn execute(
        &self,
        scene_id: SceneId,
        prefs: &GenerationPreferences,
    ) -> Result<StoryRecord, StoryError> {
        let _guard = self.records.lock(scene_id).await;
        if self.records.load(scene_id).await?.is_some() {
            return Err(StoryError::AlreadyExists(scene_id));
        }

        let mut record = self.build_record(scene_id, prefs).await?;
        let now = record.created_at();
        self.records.save(&mut record, now).await?;
        self.records
            .record_conversation(scene_id, opening_entries(&record, now))
            .await;

        tracing::info!(
            scene_id = %scene_id,
            tasks = record.tasks().len(),
            locations = record.locations().len(),
            "Story initialized"
        );
        Ok(record)
    }

    /// Build a fresh record without saving it. The caller holds the scene
    /// lock and has checked that no record exists.
    pub(super) async fn build_record(
        &self,
        scene_id: SceneId,
        prefs: &GenerationPreferences,
    ) -> Result<StoryRecord, StoryError> {
        let scene = self
            .scenes
            .get(scene_id)
            .await?
            .ok_or_else(|| StoryError::not_found("Scene", scene_id))?;

        let opening = self.generator.opening(&scene, prefs).await;
        let now = self.clock.now();
        match opening {
            Ok(payload) => Ok(from_opening(&scene, payload, now)),
            Err(e) if e.is_generation_failure() => {
                tracing::warn!(
                    scene_id = %scene_id,
                    error = %e,
                    "Opening generation failed, starting from the authored description"
                );
                Ok(from_scene(&scene, now))
            }
            Err(e) => Err(e),
        }
    }
}

fn from_opening(scene: &SceneInfo, payload: OpeningPayload, now: DateTime<Utc>) -> StoryRecord {
    let intro = non_empty(payload.intro).unwrap_or_else(|| scene.description.clone());
    let objective =
        non_empty(payload.main_objective).unwrap_or_else(|| default_objective(scene));
    let content = payload
        .content
        .and_then(non_empty)
        .unwrap_or_else(|| intro.clone());
    let title = payload
        .title
        .and_then(non_empty)
        .unwrap_or_else(|| scene.title.clone());

    let root = StoryNode::new(None, NodeType::Narrative, content, ContentSource::Generated, now)
        .with_title(title)
        .with_original_content(scene.description.clone())
        .with_choices(build_choices(payload.choices));

    let mut record = StoryRecord::new(scene.id, intro, objective, root, now);
    for task in payload
        .tasks
        .into_iter()
        .filter_map(|t| t.into_task(ContentSource::Generated))
    {
        record = record.with_task(task);
    }
    for location in payload
        .locations
        .into_iter()
        .filter_map(|l| l.into_location(ContentSource::Generated))
    {
        record = record.with_location(location);
    }
    record
}

fn from_scene(scene: &SceneInfo, now: DateTime<Utc>) -> StoryRecord {
    let root = StoryNode::new(
        None,
        NodeType::Narrative,
        scene.description.clone(),
        ContentSource::Fallback,
        now,
    )
    .with_title(scene.title.clone())
    .with_original_content(scene.description.clone());
    StoryRecord::new(
        scene.id,
        scene.description.clone(),
        default_objective(scene),
        root,
        now,
    )
}

fn default_objective(scene: &SceneInfo) -> String {
    format!("Uncover what awaits in {}", scene.title)
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub(super) fn opening_entries(record: &StoryRecord, now: DateTime<Utc>) -> Vec<ConversationEntry> {
    record
        .nodes()
        .first()
        .map(|root| vec![ConversationEntry::narrator(root.id, root.content.clone(), now)])
        .unwrap_or_default()
}
