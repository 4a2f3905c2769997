//! Story record storage adapters.
//!
//! - `FileStoryStore` - one JSON document per scene, written atomically
//! - `memory` - in-memory adapters for tests and single-process use

mod file_store;
mod memory;

pub use file_store::FileStoryStore;
pub use memory::{InMemoryConversationLog, InMemorySceneCatalog, InMemoryStoryStore};
