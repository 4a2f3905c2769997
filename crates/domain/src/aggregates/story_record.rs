//! Story record aggregate - the complete narrative state of one scene.
//!
//! # Invariants
//!
//! - Every non-root node's `parent_id` references a node in the same record
//!   (enforced on append; records loaded from disk may still contain orphans,
//!   which read paths tolerate).
//! - Nodes, tasks, locations and clues are only ever appended or flipped in place.
//! - `Choice::selected`, `Objective::completed`, `Task::completed` and
//!   `Location::accessible` only move from `false` to `true`.
//! - At most one choice per node is ever selected.
//! - `progress` stays within `0..=100`.
//!
//! All primitives are pure in-memory transitions that return a
//! [`StoryRecordChange`]; persistence and locking belong to the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::branch_tree::{self, CurrentPath};
use crate::entities::{Clue, Location, StoryNode, Task, SELECTED_AT_KEY};
use crate::events::StoryRecordChange;
use crate::value_objects::{TaskCompletionPolicy, MAX_PROGRESS};
use crate::{ChoiceId, DomainError, LocationId, NodeId, ObjectiveId, SceneId, TaskId};

/// Free-text state label given to freshly initialized records.
pub const INITIAL_STATE: &str = "introduction";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRecord {
    scene_id: SceneId,
    intro: String,
    main_objective: String,
    #[serde(default)]
    current_state: String,
    #[serde(default)]
    progress: u8,
    /// Insertion order is creation order
    #[serde(default)]
    nodes: Vec<StoryNode>,
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    locations: Vec<Location>,
    #[serde(default)]
    clues: Vec<Clue>,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

impl StoryRecord {
    // =========================================================================
    // Constructor
    // =========================================================================

    /// Create a record whose only node is `root`.
    ///
    /// The root is forced to be a revealed, parentless node.
    pub fn new(
        scene_id: SceneId,
        intro: impl Into<String>,
        main_objective: impl Into<String>,
        mut root: StoryNode,
        now: DateTime<Utc>,
    ) -> Self {
        root.parent_id = None;
        root.is_revealed = true;
        root.superseded = false;
        Self {
            scene_id,
            intro: intro.into(),
            main_objective: main_objective.into(),
            current_state: INITIAL_STATE.to_string(),
            progress: 0,
            nodes: vec![root],
            tasks: Vec::new(),
            locations: Vec::new(),
            clues: Vec::new(),
            created_at: now,
            last_updated: now,
        }
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn scene_id(&self) -> SceneId {
        self.scene_id
    }

    #[inline]
    pub fn intro(&self) -> &str {
        &self.intro
    }

    #[inline]
    pub fn main_objective(&self) -> &str {
        &self.main_objective
    }

    #[inline]
    pub fn current_state(&self) -> &str {
        &self.current_state
    }

    #[inline]
    pub fn progress(&self) -> u8 {
        self.progress
    }

    #[inline]
    pub fn nodes(&self) -> &[StoryNode] {
        &self.nodes
    }

    #[inline]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[inline]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    #[inline]
    pub fn clues(&self) -> &[Clue] {
        &self.clues
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn node(&self, node_id: NodeId) -> Option<&StoryNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn location(&self, location_id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == location_id)
    }

    fn position(&self, node_id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == node_id)
    }

    // =========================================================================
    // Derived views
    // =========================================================================

    /// The single root-to-leaf chain representing the player's history.
    pub fn current_path(&self) -> CurrentPath {
        branch_tree::find_current_path(&self.nodes)
    }

    /// The anchor of the current path (where the story continues from).
    pub fn current_leaf(&self) -> Option<&StoryNode> {
        self.current_path().anchor().and_then(|id| self.node(id))
    }

    /// Content of the last `limit` nodes on the current path, oldest first.
    pub fn recent_narration(&self, limit: usize) -> Vec<&str> {
        let path = self.current_path();
        let chain = path.chain();
        let start = chain.len().saturating_sub(limit);
        chain[start..]
            .iter()
            .filter_map(|id| self.node(*id))
            .map(|n| n.content.as_str())
            .collect()
    }

    /// Ids of nodes created after `node_id`, in creation order.
    ///
    /// "After" is ordered by `(created_at, position)` so equal timestamps are
    /// broken by insertion order.
    pub fn nodes_created_after(&self, node_id: NodeId) -> Result<Vec<NodeId>, DomainError> {
        let pos = self
            .position(node_id)
            .ok_or_else(|| DomainError::not_found("StoryNode", node_id))?;
        let cutoff = (self.nodes[pos].created_at, pos);
        Ok(self
            .nodes
            .iter()
            .enumerate()
            .filter(|(i, n)| (n.created_at, *i) > cutoff)
            .map(|(_, n)| n.id)
            .collect())
    }

    /// Nodes whose parent does not resolve inside this record.
    pub fn orphan_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| matches!(n.parent_id, Some(parent) if self.node(parent).is_none()))
            .map(|n| n.id)
            .collect()
    }

    // =========================================================================
    // Node primitives
    // =========================================================================

    /// Append a node. Its parent (if any) must already exist and its id must be new.
    pub fn append_node(&mut self, node: StoryNode) -> Result<StoryRecordChange, DomainError> {
        if self.node(node.id).is_some() {
            return Err(DomainError::validation(format!(
                "node {} already exists",
                node.id
            )));
        }
        if let Some(parent_id) = node.parent_id {
            if self.node(parent_id).is_none() {
                return Err(DomainError::validation(format!(
                    "parent node {} does not exist",
                    parent_id
                )));
            }
        }

        let change = StoryRecordChange::NodeAppended {
            node_id: node.id,
            parent_id: node.parent_id,
        };
        self.nodes.push(node);
        Ok(change)
    }

    /// Make a hidden or rewound node part of the live story again.
    pub fn reveal_node(&mut self, node_id: NodeId) -> Result<StoryRecordChange, DomainError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| DomainError::not_found("StoryNode", node_id))?;

        if node.is_live() {
            return Ok(StoryRecordChange::NodeAlreadyRevealed { node_id });
        }
        node.is_revealed = true;
        node.superseded = false;
        Ok(StoryRecordChange::NodeRevealed { node_id })
    }

    /// Mark `choice_id` on `node_id` as selected.
    ///
    /// Fails with `Validation` if either id is unknown and with `Conflict` if
    /// this choice, or any other choice on the node, is already selected.
    pub fn select_choice(
        &mut self,
        node_id: NodeId,
        choice_id: ChoiceId,
        now: DateTime<Utc>,
    ) -> Result<StoryRecordChange, DomainError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .filter(|n| n.choice(choice_id).is_some())
            .ok_or_else(|| DomainError::validation("invalid node or choice"))?;

        if let Some(existing) = node.selected_choice() {
            return Err(if existing.id == choice_id {
                DomainError::conflict(format!("choice {} is already selected", choice_id))
            } else {
                DomainError::conflict(format!(
                    "node {} already has a selected choice ({})",
                    node_id, existing.id
                ))
            });
        }

        let choice = node
            .choice_mut(choice_id)
            .ok_or_else(|| DomainError::validation("invalid node or choice"))?;
        choice.selected = true;
        choice
            .metadata
            .insert(SELECTED_AT_KEY.to_string(), now.to_rfc3339());

        Ok(StoryRecordChange::ChoiceSelected {
            node_id,
            choice_id,
            next_node_id: choice.next_node_id,
        })
    }

    /// Record the node a choice resolved to. A choice may only be linked once.
    pub fn link_choice(
        &mut self,
        node_id: NodeId,
        choice_id: ChoiceId,
        next_node_id: NodeId,
    ) -> Result<StoryRecordChange, DomainError> {
        if self.node(next_node_id).is_none() {
            return Err(DomainError::not_found("StoryNode", next_node_id));
        }
        let current = self
            .node(node_id)
            .and_then(|n| n.choice(choice_id))
            .ok_or_else(|| DomainError::validation("invalid node or choice"))?
            .next_node_id;

        // A dangling target may be replaced; a resolvable one may not
        if let Some(existing) = current {
            if existing != next_node_id && self.node(existing).is_some() {
                return Err(DomainError::conflict(format!(
                    "choice {} already leads to node {}",
                    choice_id, existing
                )));
            }
        }

        if let Some(choice) = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .and_then(|n| n.choice_mut(choice_id))
        {
            choice.next_node_id = Some(next_node_id);
        }
        Ok(StoryRecordChange::ChoiceLinked {
            node_id,
            choice_id,
            next_node_id,
        })
    }

    /// Re-anchor the live story on `node_id`.
    ///
    /// Nodes created after the target are marked superseded; the target and
    /// its ancestors are revived if an earlier rewind superseded them. Nothing
    /// is removed, so calling this twice leaves the record unchanged the
    /// second time.
    pub fn rewind_to(&mut self, node_id: NodeId) -> Result<StoryRecordChange, DomainError> {
        let pos = self
            .position(node_id)
            .ok_or_else(|| DomainError::not_found("StoryNode", node_id))?;
        if !self.nodes[pos].is_revealed {
            return Err(DomainError::validation(format!(
                "cannot rewind to hidden node {}",
                node_id
            )));
        }

        let chain = self.ancestor_positions(pos);
        let cutoff = (self.nodes[pos].created_at, pos);

        let mut revived = Vec::new();
        for &p in &chain {
            let node = &mut self.nodes[p];
            if node.superseded {
                node.superseded = false;
                revived.push(node.id);
            }
        }

        let mut superseded = Vec::new();
        for (i, node) in self.nodes.iter_mut().enumerate() {
            if (node.created_at, i) > cutoff && !node.superseded && !chain.contains(&i) {
                node.superseded = true;
                superseded.push(node.id);
            }
        }

        Ok(StoryRecordChange::NodesSuperseded {
            target: node_id,
            superseded,
            revived,
        })
    }

    /// Positions of the node at `pos` and all its resolvable ancestors.
    fn ancestor_positions(&self, pos: usize) -> Vec<usize> {
        let mut chain = vec![pos];
        let mut current = pos;
        while let Some(parent_id) = self.nodes[current].parent_id {
            match self.position(parent_id) {
                Some(p) if !chain.contains(&p) => {
                    chain.push(p);
                    current = p;
                }
                _ => break,
            }
        }
        chain
    }

    // =========================================================================
    // Task primitives
    // =========================================================================

    pub fn add_task(&mut self, task: Task) -> StoryRecordChange {
        let task_id = task.id;
        self.tasks.push(task);
        StoryRecordChange::TaskAdded { task_id }
    }

    /// Complete one objective. The parent task is only completed as a side
    /// effect under [`TaskCompletionPolicy::AllObjectives`].
    pub fn complete_objective(
        &mut self,
        task_id: TaskId,
        objective_id: ObjectiveId,
        policy: TaskCompletionPolicy,
    ) -> Result<StoryRecordChange, DomainError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| DomainError::not_found("Task", task_id))?;
        let objective = task
            .objectives
            .iter_mut()
            .find(|o| o.id == objective_id)
            .ok_or_else(|| DomainError::not_found("Objective", objective_id))?;

        if objective.completed {
            return Err(DomainError::conflict(format!(
                "objective {} is already completed",
                objective_id
            )));
        }
        objective.completed = true;

        let task_completed = policy == TaskCompletionPolicy::AllObjectives
            && !task.completed
            && task.all_objectives_completed();
        if task_completed {
            task.completed = true;
        }

        Ok(StoryRecordChange::ObjectiveCompleted {
            task_id,
            objective_id,
            task_completed,
        })
    }

    pub fn complete_task(&mut self, task_id: TaskId) -> Result<StoryRecordChange, DomainError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| DomainError::not_found("Task", task_id))?;
        if task.completed {
            return Err(DomainError::conflict(format!(
                "task {} is already completed",
                task_id
            )));
        }
        task.completed = true;
        Ok(StoryRecordChange::TaskCompleted { task_id })
    }

    // =========================================================================
    // Location primitives
    // =========================================================================

    pub fn add_location(&mut self, location: Location) -> StoryRecordChange {
        let location_id = location.id;
        self.locations.push(location);
        StoryRecordChange::LocationAdded { location_id }
    }

    /// Flip `accessible` to true. A second unlock is a conflict.
    pub fn unlock_location(
        &mut self,
        location_id: LocationId,
    ) -> Result<StoryRecordChange, DomainError> {
        let location = self
            .locations
            .iter_mut()
            .find(|l| l.id == location_id)
            .ok_or_else(|| DomainError::not_found("Location", location_id))?;
        if location.accessible {
            return Err(DomainError::conflict(format!(
                "location {} is already accessible",
                location_id
            )));
        }
        location.accessible = true;
        Ok(StoryRecordChange::LocationUnlocked { location_id })
    }

    // =========================================================================
    // Misc primitives
    // =========================================================================

    pub fn add_clue(&mut self, clue: Clue) -> StoryRecordChange {
        let clue_id = clue.id;
        self.clues.push(clue);
        StoryRecordChange::ClueAdded { clue_id }
    }

    /// Add to progress, capped at 100.
    pub fn advance_progress(&mut self, amount: u8) -> StoryRecordChange {
        let from = self.progress;
        self.progress = self.progress.saturating_add(amount).min(MAX_PROGRESS);
        StoryRecordChange::ProgressAdvanced {
            from,
            to: self.progress,
        }
    }

    pub fn set_current_state(&mut self, state: impl Into<String>) -> StoryRecordChange {
        let to = state.into();
        let from = std::mem::replace(&mut self.current_state, to.clone());
        StoryRecordChange::CurrentStateChanged { from, to }
    }

    /// Stamp the record as modified.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = now;
    }
}
