//! Domain Events
//!
//! Return types from aggregate mutations, communicating what happened when
//! state was modified. The engine logs them and folds them into operation
//! results; they are not persisted.

pub mod story_record_events;

pub use story_record_events::*;
