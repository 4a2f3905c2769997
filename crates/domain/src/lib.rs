//! Branchtale domain: the story record model and the pure algorithms over it.

extern crate self as branchtale_domain;

pub mod aggregates;
pub mod batch;
pub mod branch_tree;
pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod value_objects;

pub use aggregates::{StoryRecord, INITIAL_STATE};
pub use batch::BatchOperation;
pub use branch_tree::{
    active_path_nodes, build_branch_tree, build_branch_tree_with, current_leaf,
    find_current_path, BranchNode, BranchView, BranchViewOptions, CurrentPath,
};
pub use entities::{
    sort_choices_for_display, Choice, Clue, Location, Objective, SceneInfo, StoryNode, Task,
    SELECTED_AT_KEY,
};
pub use error::DomainError;
pub use events::StoryRecordChange;
pub use ids::{ChoiceId, ClueId, LocationId, NodeId, ObjectiveId, SceneId, TaskId};
pub use value_objects::{
    ContentSource, GenerationPreferences, NodeType, ProgressPolicy, TaskCompletionPolicy,
    MAX_PROGRESS,
};
