//! Batch mutation use case.
//!
//! Applies several primitive mutations under one lock with a single save.
//! Any failing step discards the whole batch.

use std::sync::Arc;

use branchtale_domain::{
    BatchOperation, DomainError, NodeId, SceneId, StoryRecord, StoryRecordChange,
    TaskCompletionPolicy,
};
use chrono::{DateTime, Utc};

use super::records::StoryRecords;
use super::StoryError;
use crate::infrastructure::ports::ClockPort;

pub struct ExecuteBatch {
    records: Arc<StoryRecords>,
    clock: Arc<dyn ClockPort>,
    policy: TaskCompletionPolicy,
}

impl ExecuteBatch {
    pub fn new(
        records: Arc<StoryRecords>,
        clock: Arc<dyn ClockPort>,
        policy: TaskCompletionPolicy,
    ) -> Self {
        Self {
            records,
            clock,
            policy,
        }
    }

    /// Run an arbitrary mutation against the record.
    pub async fn execute<T, F>(&self, scene_id: SceneId, f: F) -> Result<T, StoryError>
    where
        F: FnOnce(&mut StoryRecord) -> Result<T, DomainError> + Send,
        T: Send,
    {
        self.records.mutate(scene_id, self.clock.now(), f).await
    }

    /// Run a list of serializable operations in order.
    ///
    /// Rewinds inside the batch prune the transcript once the batch commits.
    pub async fn execute_operations(
        &self,
        scene_id: SceneId,
        operations: Vec<BatchOperation>,
    ) -> Result<Vec<StoryRecordChange>, StoryError> {
        let count = operations.len();
        let policy = self.policy;
        let now = self.clock.now();
        let (changes, rewound) = self
            .records
            .mutate(scene_id, now, move |record| {
                let changes = BatchOperation::apply_all(operations, record, policy, now)?;
                let rewound = rewound_history(record, &changes);
                Ok((changes, rewound))
            })
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    scene_id = %scene_id,
                    operations = count,
                    error = %e,
                    "Batch rejected"
                );
            })?;

        for (discarded, cutoff) in rewound {
            self.records
                .prune_conversation(scene_id, &discarded, cutoff)
                .await;
        }
        tracing::info!(scene_id = %scene_id, operations = count, "Batch applied");
        Ok(changes)
    }
}

/// For each rewind in `changes`: the nodes it superseded that are still off
/// the live story, and the target's creation time.
fn rewound_history(
    record: &StoryRecord,
    changes: &[StoryRecordChange],
) -> Vec<(Vec<NodeId>, DateTime<Utc>)> {
    changes
        .iter()
        .filter_map(|change| match change {
            StoryRecordChange::NodesSuperseded {
                target, superseded, ..
            } if !superseded.is_empty() => {
                let cutoff = record.node(*target)?.created_at;
                let discarded = superseded
                    .iter()
                    .copied()
                    .filter(|id| record.node(*id).is_some_and(|n| n.superseded))
                    .collect();
                Some((discarded, cutoff))
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{Harness, ScriptedLlm};
    use super::*;
    use branchtale_domain::{GenerationPreferences, LocationId};

    #[tokio::test]
    async fn operations_commit_together() {
        let harness = Harness::new(ScriptedLlm::new());
        let seeded = harness.seeded().await;
        let root = &seeded.nodes()[0];
        let task = &seeded.tasks()[0];

        let changes = harness
            .story
            .batch
            .execute_operations(
                seeded.scene_id(),
                vec![
                    BatchOperation::SelectChoice {
                        node_id: root.id,
                        choice_id: root.choices[1].id,
                    },
                    BatchOperation::CompleteObjective {
                        task_id: task.id,
                        objective_id: task.objectives[0].id,
                    },
                    BatchOperation::UnlockLocation {
                        location_id: seeded.locations()[0].id,
                    },
                    BatchOperation::AdvanceProgress { amount: 25 },
                ],
            )
            .await
            .unwrap();

        assert_eq!(changes.len(), 4);
        let stored = harness.stored(seeded.scene_id()).await;
        assert!(stored.node(root.id).unwrap().choices[1].selected);
        assert!(stored.tasks()[0].objectives[0].completed);
        assert!(stored.locations()[0].accessible);
        assert_eq!(stored.progress(), 25);
    }

    #[tokio::test]
    async fn failing_step_discards_earlier_steps() {
        let harness = Harness::new(ScriptedLlm::new());
        let seeded = harness.seeded().await;

        let err = harness
            .story
            .batch
            .execute_operations(
                seeded.scene_id(),
                vec![
                    BatchOperation::AdvanceProgress { amount: 40 },
                    BatchOperation::UnlockLocation {
                        location_id: LocationId::new(),
                    },
                ],
            )
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(harness.stored(seeded.scene_id()).await, seeded);
    }

    #[tokio::test]
    async fn rewind_operation_prunes_transcript_after_commit() {
        let harness = Harness::new(ScriptedLlm::new());
        let seeded = harness.seeded().await;
        let scene_id = seeded.scene_id();
        let prefs = GenerationPreferences::default();
        let a = harness.story.advance.execute(scene_id, &prefs).await.unwrap();
        let b = harness.story.advance.execute(scene_id, &prefs).await.unwrap();
        assert_eq!(harness.conversation.entries(scene_id).await.len(), 2);

        let changes = harness
            .story
            .batch
            .execute_operations(
                scene_id,
                vec![
                    BatchOperation::Rewind { node_id: a.node_id },
                    BatchOperation::SetCurrentState {
                        state: "rewound".into(),
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(
            changes[0],
            StoryRecordChange::NodesSuperseded {
                target: a.node_id,
                superseded: vec![b.node_id],
                revived: vec![]
            }
        );
        let stored = harness.stored(scene_id).await;
        assert!(stored.node(b.node_id).unwrap().superseded);
        assert_eq!(stored.current_leaf().map(|n| n.id), Some(a.node_id));
        assert_eq!(stored.current_state(), "rewound");
        let remaining = harness.conversation.entries(scene_id).await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].node_id, Some(a.node_id));
    }

    #[tokio::test]
    async fn failed_batch_with_rewind_keeps_transcript() {
        let harness = Harness::new(ScriptedLlm::new());
        let scene_id = harness.seeded().await.scene_id();
        let root_id = harness.stored(scene_id).await.nodes()[0].id;
        harness
            .story
            .advance
            .execute(scene_id, &GenerationPreferences::default())
            .await
            .unwrap();
        let before = harness.stored(scene_id).await;

        let err = harness
            .story
            .batch
            .execute_operations(
                scene_id,
                vec![
                    BatchOperation::Rewind { node_id: root_id },
                    BatchOperation::UnlockLocation {
                        location_id: LocationId::new(),
                    },
                ],
            )
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(harness.stored(scene_id).await, before);
        assert_eq!(harness.conversation.entries(scene_id).await.len(), 1);
    }

    #[tokio::test]
    async fn closure_batch_sees_its_own_writes() {
        let harness = Harness::new(ScriptedLlm::new());
        let seeded = harness.seeded().await;
        let location_id = seeded.locations()[0].id;

        let result = harness
            .story
            .batch
            .execute(seeded.scene_id(), move |record| {
                record.unlock_location(location_id)?;
                // A second unlock inside the same batch conflicts
                record.unlock_location(location_id)
            })
            .await;

        assert!(result.unwrap_err().is_conflict());
        assert!(!harness.stored(seeded.scene_id()).await.locations()[0].accessible);
    }
}
