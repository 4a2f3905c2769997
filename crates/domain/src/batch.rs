//! Serializable story record mutations.
//!
//! Callers that cannot hand the engine a closure (CLI, socket clients) describe
//! a batch as a list of [`BatchOperation`]s. The list is applied in order and
//! the first failure aborts it; the engine discards the partially mutated copy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregates::StoryRecord;
use crate::entities::{Clue, Location, Task};
use crate::events::StoryRecordChange;
use crate::value_objects::{ContentSource, TaskCompletionPolicy};
use crate::{ChoiceId, DomainError, LocationId, NodeId, ObjectiveId, TaskId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum BatchOperation {
    SelectChoice {
        node_id: NodeId,
        choice_id: ChoiceId,
    },
    RevealNode {
        node_id: NodeId,
    },
    CompleteObjective {
        task_id: TaskId,
        objective_id: ObjectiveId,
    },
    CompleteTask {
        task_id: TaskId,
    },
    AddTask {
        task: Task,
    },
    AddLocation {
        location: Location,
    },
    UnlockLocation {
        location_id: LocationId,
    },
    AddClue {
        text: String,
    },
    AdvanceProgress {
        amount: u8,
    },
    SetCurrentState {
        state: String,
    },
    /// Re-anchor the current path on `node_id`
    Rewind {
        node_id: NodeId,
    },
}

impl BatchOperation {
    pub fn apply(
        self,
        record: &mut StoryRecord,
        policy: TaskCompletionPolicy,
        now: DateTime<Utc>,
    ) -> Result<StoryRecordChange, DomainError> {
        match self {
            Self::SelectChoice { node_id, choice_id } => {
                record.select_choice(node_id, choice_id, now)
            }
            Self::RevealNode { node_id } => record.reveal_node(node_id),
            Self::CompleteObjective {
                task_id,
                objective_id,
            } => record.complete_objective(task_id, objective_id, policy),
            Self::CompleteTask { task_id } => record.complete_task(task_id),
            Self::AddTask { task } => Ok(record.add_task(task)),
            Self::AddLocation { location } => Ok(record.add_location(location)),
            Self::UnlockLocation { location_id } => record.unlock_location(location_id),
            Self::AddClue { text } => {
                if text.trim().is_empty() {
                    return Err(DomainError::validation("clue text must not be empty"));
                }
                Ok(record.add_clue(Clue::new(text, ContentSource::Player, now)))
            }
            Self::AdvanceProgress { amount } => Ok(record.advance_progress(amount)),
            Self::SetCurrentState { state } => Ok(record.set_current_state(state)),
            Self::Rewind { node_id } => record.rewind_to(node_id),
        }
    }

    /// Apply `ops` in order, stopping at the first error.
    pub fn apply_all(
        ops: Vec<BatchOperation>,
        record: &mut StoryRecord,
        policy: TaskCompletionPolicy,
        now: DateTime<Utc>,
    ) -> Result<Vec<StoryRecordChange>, DomainError> {
        ops.into_iter()
            .map(|op| op.apply(record, policy, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::StoryNode;
    use crate::value_objects::NodeType;
    use crate::SceneId;

    fn record() -> StoryRecord {
        let now = Utc::now();
        let root = StoryNode::new(None, NodeType::Narrative, "start", ContentSource::Authored, now);
        StoryRecord::new(SceneId::new(), "intro", "goal", root, now)
    }

    #[test]
    fn batch_applies_in_order() {
        let mut record = record();
        let location = Location::new("Vault", ContentSource::Authored);
        let location_id = location.id;

        let changes = BatchOperation::apply_all(
            vec![
                BatchOperation::AddLocation { location },
                BatchOperation::UnlockLocation { location_id },
                BatchOperation::AdvanceProgress { amount: 15 },
            ],
            &mut record,
            TaskCompletionPolicy::Manual,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(changes.len(), 3);
        assert!(record.location(location_id).unwrap().accessible);
        assert_eq!(record.progress(), 15);
    }

    #[test]
    fn batch_stops_at_first_error() {
        let mut record = record();
        let err = BatchOperation::apply_all(
            vec![
                BatchOperation::AdvanceProgress { amount: 5 },
                BatchOperation::UnlockLocation {
                    location_id: LocationId::new(),
                },
                BatchOperation::AdvanceProgress { amount: 5 },
            ],
            &mut record,
            TaskCompletionPolicy::Manual,
            Utc::now(),
        )
        .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(record.progress(), 5, "ops after the failure never run");
    }

    #[test]
    fn rewind_operation_supersedes_and_combines_with_progress() {
        let mut record = record();
        let root_id = record.nodes()[0].id;
        let later = StoryNode::new(
            Some(root_id),
            NodeType::Narrative,
            "later",
            ContentSource::Generated,
            record.created_at() + chrono::Duration::minutes(1),
        );
        let later_id = later.id;
        record.append_node(later).unwrap();

        let ops: Vec<BatchOperation> = serde_json::from_str(&format!(
            r#"[{{"op":"rewind","nodeId":"{root_id}"}},{{"op":"advance_progress","amount":5}}]"#
        ))
        .unwrap();
        let changes =
            BatchOperation::apply_all(ops, &mut record, TaskCompletionPolicy::Manual, Utc::now())
                .unwrap();

        assert_eq!(
            changes[0],
            StoryRecordChange::NodesSuperseded {
                target: root_id,
                superseded: vec![later_id],
                revived: vec![]
            }
        );
        assert!(record.node(later_id).unwrap().superseded);
        assert_eq!(record.progress(), 5);
    }

    #[test]
    fn rewind_to_unknown_node_aborts_batch() {
        let mut record = record();
        let before = record.clone();
        let err = BatchOperation::Rewind {
            node_id: NodeId::new(),
        }
        .apply(&mut record, TaskCompletionPolicy::Manual, Utc::now())
        .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(record, before);
    }

    #[test]
    fn operations_deserialize_from_tagged_json() {
        let node_id = NodeId::new();
        let choice_id = ChoiceId::new();
        let json = format!(
            r#"[{{"op":"select_choice","nodeId":"{node_id}","choiceId":"{choice_id}"}},{{"op":"add_clue","text":"A torn map"}}]"#
        );
        let ops: Vec<BatchOperation> = serde_json::from_str(&json).unwrap();
        assert_eq!(
            ops[0],
            BatchOperation::SelectChoice { node_id, choice_id }
        );
        assert!(matches!(ops[1], BatchOperation::AddClue { .. }));
    }
}
