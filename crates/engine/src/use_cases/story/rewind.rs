//! Rewind use case.
//!
//! Re-anchors the story on an earlier node. Later nodes stay in the record
//! (flagged superseded) so the branch view keeps the full history. Transcript
//! entries from after the target are pruned best-effort.

use std::sync::Arc;

use branchtale_domain::{
    build_branch_tree, BranchView, NodeId, SceneId, StoryRecord, StoryRecordChange,
};
use serde::Serialize;

use super::records::StoryRecords;
use super::StoryError;
use crate::infrastructure::ports::ClockPort;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewindOutcome {
    pub record: StoryRecord,
    pub view: BranchView,
    /// Nodes newly excluded from the live story by this call
    pub superseded: Vec<NodeId>,
    /// Target ancestry restored from an earlier rewind
    pub revived: Vec<NodeId>,
}

pub struct RewindToNode {
    records: Arc<StoryRecords>,
    clock: Arc<dyn ClockPort>,
}

impl RewindToNode {
    pub fn new(records: Arc<StoryRecords>, clock: Arc<dyn ClockPort>) -> Self {
        Self { records, clock }
    }

    pub async fn execute(
        &self,
        scene_id: SceneId,
        node_id: NodeId,
    ) -> Result<RewindOutcome, StoryError> {
        let _guard = self.records.lock(scene_id).await;
        let mut record = self.records.require(scene_id).await?;

        let cutoff = record
            .node(node_id)
            .map(|n| n.created_at)
            .ok_or_else(|| StoryError::not_found("StoryNode", node_id))?;
        let after = record.nodes_created_after(node_id)?;

        let (superseded, revived) = match record.rewind_to(node_id)? {
            StoryRecordChange::NodesSuperseded {
                superseded,
                revived,
                ..
            } => (superseded, revived),
            _ => (Vec::new(), Vec::new()),
        };

        if !superseded.is_empty() || !revived.is_empty() {
            self.records.save(&mut record, self.clock.now()).await?;
        }

        // Everything after the cutoff that is now off the live story
        let discarded: Vec<NodeId> = after
            .into_iter()
            .filter(|id| record.node(*id).is_some_and(|n| n.superseded))
            .collect();
        self.records
            .prune_conversation(scene_id, &discarded, cutoff)
            .await;

        tracing::info!(
            scene_id = %scene_id,
            node_id = %node_id,
            superseded = superseded.len(),
            revived = revived.len(),
            "Story rewound"
        );

        let view = build_branch_tree(record.nodes());
        Ok(RewindOutcome {
            record,
            view,
            superseded,
            revived,
        })
    }
}
