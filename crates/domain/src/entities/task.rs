//! Task entity - goal structure tracked beside the node graph.

use serde::{Deserialize, Serialize};

use branchtale_domain::{ContentSource, ObjectiveId, TaskId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reward: String,
    /// Monotonic; only the engine sets it
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "default_true")]
    pub is_revealed: bool,
    #[serde(default)]
    pub source: ContentSource,
    #[serde(default)]
    pub objectives: Vec<Objective>,
}

fn default_true() -> bool {
    true
}

impl Task {
    pub fn new(title: impl Into<String>, source: ContentSource) -> Self {
        Self {
            id: TaskId::new(),
            title: title.into(),
            description: String::new(),
            reward: String::new(),
            completed: false,
            is_revealed: true,
            source,
            objectives: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_reward(mut self, reward: impl Into<String>) -> Self {
        self.reward = reward.into();
        self
    }

    pub fn with_objective(mut self, description: impl Into<String>) -> Self {
        self.objectives.push(Objective::new(description));
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_revealed = false;
        self
    }

    pub fn objective(&self, objective_id: ObjectiveId) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.id == objective_id)
    }

    /// True when there is at least one objective and all are completed.
    pub fn all_objectives_completed(&self) -> bool {
        !self.objectives.is_empty() && self.objectives.iter().all(|o| o.completed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    pub id: ObjectiveId,
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

impl Objective {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: ObjectiveId::new(),
            description: description.into(),
            completed: false,
        }
    }
}
