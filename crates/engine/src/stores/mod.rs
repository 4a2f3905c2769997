//! In-memory state storage modules.
//!
//! Stores manage runtime state that doesn't belong in the story record:
//! - `SceneLocks` - per-scene mutation exclusivity

pub mod scene_locks;

pub use scene_locks::SceneLocks;
