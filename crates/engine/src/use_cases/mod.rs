//! Use cases - User story orchestration.
//!
//! Use cases orchestrate ports and the domain aggregate to fulfil engine
//! operations.

pub mod story;

pub use story::{StoryError, StoryPorts, StoryUseCases};
