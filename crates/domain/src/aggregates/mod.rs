//! Aggregate roots - domain objects that own their related data
//!
//! Each aggregate:
//! - Has a unique identity
//! - Owns all its constituent parts (enforced by Rust ownership)
//! - Exposes behavior through methods, not public fields
//! - Returns change enums from mutations

pub mod story_record;

pub use story_record::{StoryRecord, INITIAL_STATE};
