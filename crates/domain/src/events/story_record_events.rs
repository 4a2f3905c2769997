//! Story record mutation outcomes.

use crate::{ChoiceId, ClueId, LocationId, NodeId, ObjectiveId, TaskId};

/// Outcome of one primitive mutation on a story record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryRecordChange {
    NodeAppended { node_id: NodeId, parent_id: Option<NodeId> },
    NodeRevealed { node_id: NodeId },
    NodeAlreadyRevealed { node_id: NodeId },
    ChoiceSelected {
        node_id: NodeId,
        choice_id: ChoiceId,
        next_node_id: Option<NodeId>,
    },
    ChoiceLinked {
        node_id: NodeId,
        choice_id: ChoiceId,
        next_node_id: NodeId,
    },
    ObjectiveCompleted {
        task_id: TaskId,
        objective_id: ObjectiveId,
        task_completed: bool,
    },
    TaskCompleted { task_id: TaskId },
    TaskAdded { task_id: TaskId },
    LocationAdded { location_id: LocationId },
    LocationUnlocked { location_id: LocationId },
    ClueAdded { clue_id: ClueId },
    NodesSuperseded {
        target: NodeId,
        superseded: Vec<NodeId>,
        revived: Vec<NodeId>,
    },
    ProgressAdvanced { from: u8, to: u8 },
    CurrentStateChanged { from: String, to: String },
}
