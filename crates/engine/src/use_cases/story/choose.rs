//! Make choice use case.
//!
//! Selects a choice on a node. A choice that already resolves to a node
//! reuses it (reviving it if a rewind superseded it); otherwise the outcome is
//! generated and linked as the choice's target. Selection is at most once per
//! node, enforced under the scene lock.

use std::sync::Arc;

use branchtale_domain::{
    ChoiceId, GenerationPreferences, NodeId, SceneId, StoryNode, StoryRecordChange,
};
use serde::Serialize;

use super::advance::apply_beat;
use super::generation::{StoryContext, StoryGenerator};
use super::records::StoryRecords;
use super::StoryError;
use crate::infrastructure::ports::{ClockPort, ConversationEntry};

/// The node a choice led to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOutcome {
    pub node: StoryNode,
    /// Target existed before the choice was made
    pub reused: bool,
}

pub struct MakeChoice {
    records: Arc<StoryRecords>,
    generator: Arc<StoryGenerator>,
    clock: Arc<dyn ClockPort>,
    narration_window: usize,
}

impl MakeChoice {
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
        node_id: NodeId,
        choice_id: ChoiceId,
        prefs: &GenerationPreferences,
    ) -> Result<ChoiceOutcome, StoryError> {
        let _guard = self.records.lock(scene_id).await;
        let mut record = self.records.require(scene_id).await?;

        let origin = record
            .node(node_id)
            .filter(|n| n.choice(choice_id).is_some())
            .cloned()
            .ok_or_else(|| StoryError::InvalidArgument("invalid node or choice".into()))?;
        if !origin.is_live() {
            return Err(StoryError::InvalidArgument(format!(
                "node {} is not part of the live story",
                node_id
            )));
        }

        let now = self.clock.now();
        let change = record.select_choice(node_id, choice_id, now)?;
        let existing = match change {
            StoryRecordChange::ChoiceSelected { next_node_id, .. } => {
                next_node_id.filter(|id| record.node(*id).is_some())
            }
            _ => None,
        };
        let choice = origin
            .choice(choice_id)
            .cloned()
            .ok_or_else(|| StoryError::InvalidArgument("invalid node or choice".into()))?;

        let mut entries = vec![ConversationEntry::player(node_id, choice.text.clone(), now)];
        let (next_id, reused) = match existing {
            Some(target) => {
                record.reveal_node(target)?;
                (target, true)
            }
            None => {
                let context = StoryContext::for_anchor(&record, &origin, self.narration_window);
                let beat = self.generator.choice_outcome(&context, &choice, prefs).await?;
                let now = self.clock.now();
                let applied = apply_beat(&mut record, beat, node_id, now)?;
                record.link_choice(node_id, choice_id, applied.node_id)?;
                entries.push(ConversationEntry::narrator(
                    applied.node_id,
                    applied.content,
                    now,
                ));
                (applied.node_id, false)
            }
        };

        let node = record
            .node(next_id)
            .cloned()
            .ok_or_else(|| StoryError::not_found("StoryNode", next_id))?;
        self.records.save(&mut record, now).await?;
        self.records.record_conversation(scene_id, entries).await;

        tracing::info!(
            scene_id = %scene_id,
            node_id = %node_id,
            choice_id = %choice_id,
            next_node_id = %next_id,
            reused,
            "Choice made"
        );
        Ok(ChoiceOutcome { node, reused })
    }
}
