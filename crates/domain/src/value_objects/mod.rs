//! Value objects - Immutable objects defined by their attributes

mod node_type;
mod policies;
mod preferences;

pub use node_type::{ContentSource, NodeType};
pub use policies::{ProgressPolicy, TaskCompletionPolicy, MAX_PROGRESS};
pub use preferences::GenerationPreferences;
