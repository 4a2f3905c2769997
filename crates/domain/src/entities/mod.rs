//! Domain entities - Core business objects with identity

mod clue;
mod location;
mod scene;
mod story_node;
mod task;

pub use clue::Clue;
pub use location::Location;
pub use scene::SceneInfo;
pub use story_node::{sort_choices_for_display, Choice, StoryNode, SELECTED_AT_KEY};
pub use task::{Objective, Task};
