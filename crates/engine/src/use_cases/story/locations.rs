//! Location use cases: unlocking and exploring.

use std::sync::Arc;

use branchtale_domain::{
    Clue, ContentSource, GenerationPreferences, Location, LocationId, NodeType, SceneId,
    StoryNode,
};
use serde::Serialize;

use super::generation::{StoryContext, StoryGenerator};
use super::records::StoryRecords;
use super::StoryError;
use crate::infrastructure::ports::{ClockPort, ConversationEntry};

pub struct UnlockLocation {
    records: Arc<StoryRecords>,
    clock: Arc<dyn ClockPort>,
}

impl UnlockLocation {
    pub fn new(records: Arc<StoryRecords>, clock: Arc<dyn ClockPort>) -> Self {
        Self { records, clock }
    }

    /// Make a location accessible. Unlocking an accessible location is a conflict.
    pub async fn execute(
        &self,
        scene_id: SceneId,
        location_id: LocationId,
    ) -> Result<Location, StoryError> {
        let location = self
            .records
            .mutate(scene_id, self.clock.now(), move |record| {
                record.unlock_location(location_id)?;
                Ok(record.location(location_id).cloned())
            })
            .await?;
        tracing::info!(scene_id = %scene_id, location_id = %location_id, "Location unlocked");
        location.ok_or_else(|| StoryError::not_found("Location", location_id))
    }
}

/// What exploring a location turned up.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorationResult {
    pub location_id: LocationId,
    pub description: String,
    /// Reported to the caller only; items are not tracked on the record
    pub item: Option<String>,
    pub clue: Option<Clue>,
    pub node: Option<StoryNode>,
}

pub struct ExploreLocation {
    records: Arc<StoryRecords>,
    generator: Arc<StoryGenerator>,
    clock: Arc<dyn ClockPort>,
    narration_window: usize,
}

impl ExploreLocation {
    pub fn new(
        records: Arc<StoryRecords>,
        generator: Arc<StoryGenerator>,
        clock: Arc<dyn ClockPort>,
        narration_window: usize,
    ) -> Self {
        Self {
            records,
            generator,
            clock,
            narration_window,
        }
    }

    pub async fn execute(
        &self,
        scene_id: SceneId,
        location_id: LocationId,
        prefs: &GenerationPreferences,
    ) -> Result<ExplorationResult, StoryError> {
        let _guard = self.records.lock(scene_id).await;
        let mut record = self.records.require(scene_id).await?;

        let location = record
            .location(location_id)
            .cloned()
            .ok_or_else(|| StoryError::not_found("Location", location_id))?;
        if !location.accessible {
            return Err(StoryError::Conflict(format!(
                "location {} is not accessible",
                location_id
            )));
        }

        let anchor = record.current_leaf().cloned();
        let context = match &anchor {
            Some(anchor) => StoryContext::for_anchor(&record, anchor, self.narration_window),
            None => StoryContext::default(),
        };
        let payload = self
            .generator
            .exploration(&context, &location, prefs)
            .await?;

        let now = self.clock.now();
        let clue = payload
            .clue
            .filter(|c| !c.trim().is_empty())
            .map(|text| {
                Clue::new(text.trim(), ContentSource::Generated, now).from_location(location_id)
            });
        if let Some(clue) = &clue {
            record.add_clue(clue.clone());
        }

        let node = match (payload.node, &anchor) {
            (Some(beat), Some(anchor)) if !beat.content.trim().is_empty() => {
                let title = beat
                    .title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| location.name.clone());
                let node = StoryNode::new(
                    Some(anchor.id),
                    NodeType::Exploration,
                    beat.content.trim(),
                    ContentSource::Generated,
                    now,
                )
                .with_title(title);
                record.append_node(node.clone())?;
                Some(node)
            }
            _ => None,
        };

        self.records.save(&mut record, now).await?;
        if let Some(node) = &node {
            self.records
                .record_conversation(
                    scene_id,
                    vec![ConversationEntry::narrator(node.id, node.content.clone(), now)],
                )
                .await;
        }

        tracing::info!(
            scene_id = %scene_id,
            location_id = %location_id,
            clue = clue.is_some(),
            node = node.is_some(),
            "Location explored"
        );
        Ok(ExplorationResult {
            location_id,
            description: payload.description.trim().to_string(),
            item: payload.item.filter(|i| !i.trim().is_empty()),
            clue,
            node,
        })
    }
}
