//! Advance story use case.
//!
//! Continues the story from the current path's anchor with one generated
//! beat. A scene without a record is initialized first, under the same lock,
//! and both are saved together.

use std::sync::Arc;

use branchtale_domain::{
    Clue, ContentSource, DomainError, GenerationPreferences, NodeId, NodeType, ProgressPolicy,
    SceneId, StoryRecord, Task, MAX_PROGRESS,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::generation::{BeatPayload, StoryContext, StoryGenerator};
use super::initialize::{opening_entries, InitializeStory};
use super::records::StoryRecords;
use super::StoryError;
use crate::infrastructure::ports::{ClockPort, ConversationEntry, RandomPort};

pub const STATE_IN_PROGRESS: &str = "in_progress";
pub const STATE_COMPLETED: &str = "completed";

/// Summary of one advance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryUpdate {
    pub node_id: NodeId,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub new_task: Option<Task>,
    pub new_clue: Option<Clue>,
    pub progress: u8,
    /// The record was created by this call
    pub initialized: bool,
}

pub struct AdvanceStory {
    records: Arc<StoryRecords>,
    initialize: Arc<InitializeStory>,
    generator: Arc<StoryGenerator>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
    progress_policy: ProgressPolicy,
    narration_window: usize,
}

impl AdvanceStory {
    pub fn new(
        records: Arc<StoryRecords>,
        initialize: Arc<InitializeStory>,
        generator: Arc<StoryGenerator>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        progress_policy: ProgressPolicy,
        narration_window: usize,
    ) -> Self {
        Self {
            records,
            initialize,
            generator,
            clock,
            random,
            progress_policy,
            narration_window,
        }
    }

    pub async fn execute(
        &self,
        scene_id: SceneId,
        prefs: &GenerationPreferences,
    ) -> Result<StoryUpdate, StoryError> {
        let _guard = self.records.lock(scene_id).await;

        let (mut record, initialized) = match self.records.load(scene_id).await? {
            Some(record) => (record, false),
            None => {
                tracing::info!(
                    scene_id = %scene_id,
                    "No story record, initializing before advancing"
                );
                (self.initialize.build_record(scene_id, prefs).await?, true)
            }
        };

        let anchor_id = record
            .current_leaf()
            .map(|leaf| leaf.id)
            .ok_or_else(|| StoryError::InvalidArgument("story has no live node".into()))?;
        let context = StoryContext::for_current_leaf(&record, self.narration_window);
        let beat = self.generator.beat(&context, prefs).await?;

        let now = self.clock.now();
        let applied = apply_beat(&mut record, beat, anchor_id, now)?;

        let step = self
            .progress_policy
            .increment(|lo, hi| self.random.gen_range(lo, hi));
        record.advance_progress(step);
        let state = if record.progress() >= MAX_PROGRESS {
            STATE_COMPLETED
        } else {
            STATE_IN_PROGRESS
        };
        record.set_current_state(state);

        self.records.save(&mut record, now).await?;

        let mut entries = if initialized {
            opening_entries(&record, now)
        } else {
            Vec::new()
        };
        entries.push(ConversationEntry::narrator(
            applied.node_id,
            applied.content.clone(),
            now,
        ));
        self.records.record_conversation(scene_id, entries).await;

        tracing::info!(
            scene_id = %scene_id,
            node_id = %applied.node_id,
            parent_id = %anchor_id,
            progress = record.progress(),
            initialized,
            "Story advanced"
        );

        Ok(StoryUpdate {
            node_id: applied.node_id,
            title: applied.title,
            content: applied.content,
            node_type: applied.node_type,
            new_task: applied.new_task,
            new_clue: applied.new_clue,
            progress: record.progress(),
            initialized,
        })
    }
}

/// What a beat added to a record.
pub(super) struct AppliedBeat {
    pub node_id: NodeId,
    pub title: String,
    pub content: String,
    pub node_type: NodeType,
    pub new_task: Option<Task>,
    pub new_clue: Option<Clue>,
}

/// Append the beat's node under `parent_id`, plus any task or clue it carries.
pub(super) fn apply_beat(
    record: &mut StoryRecord,
    beat: BeatPayload,
    parent_id: NodeId,
    now: DateTime<Utc>,
) -> Result<AppliedBeat, DomainError> {
    let node = beat.to_node(parent_id, now);
    let applied = AppliedBeat {
        node_id: node.id,
        title: node.title.clone(),
        content: node.content.clone(),
        node_type: node.node_type,
        new_task: beat
            .new_task
            .and_then(|t| t.into_task(ContentSource::Generated)),
        new_clue: beat
            .new_clue
            .filter(|c| !c.trim().is_empty())
            .map(|text| Clue::new(text.trim(), ContentSource::Generated, now).from_node(node.id)),
    };

    record.append_node(node)?;
    if let Some(task) = &applied.new_task {
        record.add_task(task.clone());
    }
    if let Some(clue) = &applied.new_clue {
        record.add_clue(clue.clone());
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{Harness, ScriptedLlm};
    use super::*;
    use crate::infrastructure::ports::{MockClockPort, MockRandomPort, StoryRecordRepo};
    use crate::infrastructure::settings::EngineSettings;
    use chrono::TimeZone;
    use std::time::Duration;

    const BEAT_WITH_EXTRAS: &str = r#"{
        "title": "The Flooded Nave",
        "content": "Cold water swirls around your knees.",
        "type": "discovery",
        "choices": [{"text": "Wade deeper"}],
        "newTask": {"title": "Drain the nave", "objectives": ["Find the sluice"]},
        "newClue": "Wet footprints lead to the crypt"
    }"#;

    #[tokio::test]
    async fn missing_record_is_initialized_then_advanced() {
        let harness = Harness::new(
            ScriptedLlm::new()
                .reply(r#"{"intro": "Night falls.", "mainObjective": "Survive", "content": "You arrive."}"#)
                .reply(r#"{"content": "A bell rings."}"#),
        );
        let scene_id = harness.scene().await;

        let update = harness
            .story
            .advance
            .execute(scene_id, &GenerationPreferences::default())
            .await
            .unwrap();

        assert!(update.initialized);
        let record = harness.stored(scene_id).await;
        assert_eq!(record.nodes().len(), 2);
        assert!(record.progress() > 0);
        assert_eq!(record.current_leaf().map(|n| n.id), Some(update.node_id));
        assert_eq!(record.nodes()[1].parent_id, Some(record.nodes()[0].id));
        assert_eq!(harness.conversation.entries(scene_id).await.len(), 2);
    }

    #[tokio::test]
    async fn beat_extras_become_task_and_clue() {
        let harness = Harness::new(ScriptedLlm::new().reply(BEAT_WITH_EXTRAS));
        let seeded = harness.seeded().await;
        let scene_id = seeded.scene_id();

        let update = harness
            .story
            .advance
            .execute(scene_id, &GenerationPreferences::default())
            .await
            .unwrap();

        assert_eq!(update.title, "The Flooded Nave");
        assert_eq!(update.node_type, NodeType::Discovery);
        assert_eq!(update.progress, 10);
        let task = update.new_task.unwrap();
        let clue = update.new_clue.unwrap();
        assert_eq!(clue.node_id, Some(update.node_id));

        let record = harness.stored(scene_id).await;
        assert_eq!(record.tasks().len(), 2);
        assert!(record.task(task.id).is_some());
        assert_eq!(record.clues().len(), 1);
        assert_eq!(record.current_state(), STATE_IN_PROGRESS);
    }

    #[tokio::test]
    async fn random_policy_uses_random_port() {
        let settings = EngineSettings {
            progress_policy: ProgressPolicy::Random { min: 9, max: 5 },
            ..EngineSettings::default()
        };
        let stamp = Utc.with_ymd_and_hms(2025, 7, 4, 18, 30, 0).unwrap();
        let mut clock = MockClockPort::new();
        clock.expect_now().return_const(stamp);
        let mut random = MockRandomPort::new();
        random
            .expect_gen_range()
            .withf(|min, max| (*min, *max) == (5, 9))
            .times(1)
            .returning(|_, _| 6);
        let harness =
            Harness::with_ports(ScriptedLlm::new(), settings, Arc::new(clock), Arc::new(random));
        let scene_id = harness.seeded().await.scene_id();

        let update = harness
            .story
            .advance
            .execute(scene_id, &GenerationPreferences::default())
            .await
            .unwrap();

        assert_eq!(update.progress, 6);
        let stored = harness.stored(scene_id).await;
        assert_eq!(stored.node(update.node_id).unwrap().created_at, stamp);
        assert_eq!(stored.last_updated(), stamp);
    }

    #[tokio::test]
    async fn progress_caps_and_marks_completion() {
        let settings = EngineSettings {
            progress_policy: ProgressPolicy::Fixed { step: 60 },
            ..EngineSettings::default()
        };
        let harness = Harness::with_settings(ScriptedLlm::new(), settings);
        let scene_id = harness.seeded().await.scene_id();
        let prefs = GenerationPreferences::default();

        harness.story.advance.execute(scene_id, &prefs).await.unwrap();
        let update = harness.story.advance.execute(scene_id, &prefs).await.unwrap();

        assert_eq!(update.progress, 100);
        assert_eq!(harness.stored(scene_id).await.current_state(), STATE_COMPLETED);
    }

    #[tokio::test]
    async fn consecutive_advances_extend_one_chain() {
        let harness = Harness::new(ScriptedLlm::new());
        let scene_id = harness.seeded().await.scene_id();
        let prefs = GenerationPreferences::default();

        let first = harness.story.advance.execute(scene_id, &prefs).await.unwrap();
        let second = harness.story.advance.execute(scene_id, &prefs).await.unwrap();

        let record = harness.stored(scene_id).await;
        assert_eq!(record.node(second.node_id).unwrap().parent_id, Some(first.node_id));
        assert_eq!(record.current_path().len(), 3);
    }

    #[tokio::test]
    async fn timeout_leaves_record_unchanged() {
        let settings = EngineSettings {
            generation_timeout_secs: 1,
            ..EngineSettings::default()
        };
        let harness = Harness::with_settings(
            ScriptedLlm::new().delayed(Duration::from_secs(5)),
            settings,
        );
        let seeded = harness.seeded().await;
        let scene_id = seeded.scene_id();

        let err = harness
            .story
            .advance
            .execute(scene_id, &GenerationPreferences::default())
            .await
            .unwrap_err();

        assert!(matches!(err, StoryError::GenerationTimeout(_)));
        assert_eq!(harness.stored(scene_id).await, seeded);
    }

    #[tokio::test]
    async fn failed_generation_after_auto_initialize_saves_nothing() {
        let harness = Harness::new(
            ScriptedLlm::new()
                .reply(r#"{"intro": "Night falls.", "content": "You arrive."}"#)
                .reply("   "),
        );
        let scene_id = harness.scene().await;

        let err = harness
            .story
            .advance
            .execute(scene_id, &GenerationPreferences::default())
            .await
            .unwrap_err();

        assert!(matches!(err, StoryError::EmptyGeneration));
        assert_eq!(harness.store.len().await, 0);
    }

    #[tokio::test]
    async fn advance_continues_past_dangling_nodes() {
        let harness = Harness::new(ScriptedLlm::new());
        let seeded = harness.seeded().await;
        let scene_id = seeded.scene_id();
        let root_id = seeded.nodes()[0].id;

        // A node whose parent is unknown, written by an older version
        let mut json = serde_json::to_value(&seeded).unwrap();
        json["nodes"].as_array_mut().unwrap().push(serde_json::json!({
            "id": NodeId::new(),
            "parentId": NodeId::new(),
            "content": "lost",
            "createdAt": "2025-05-01T07:00:00Z"
        }));
        let corrupt: StoryRecord = serde_json::from_value(json).unwrap();
        harness.store.save(&corrupt).await.unwrap();

        let update = harness
            .story
            .advance
            .execute(scene_id, &GenerationPreferences::default())
            .await
            .unwrap();

        let record = harness.stored(scene_id).await;
        assert_eq!(record.node(update.node_id).unwrap().parent_id, Some(root_id));
    }
}
