//! Story engine error taxonomy.

use std::time::Duration;

use branchtale_domain::{DomainError, SceneId};

use crate::infrastructure::ports::{LlmError, RepoError};

/// Narration shown to the player when generation fails and the caller chooses
/// to degrade gracefully instead of surfacing the error.
pub const FALLBACK_NARRATION: &str =
    "The story pauses for a moment, as if the narrator has lost the thread. Try again shortly.";

#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    /// Scene, story, node, task, objective or location absent
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Story already exists for scene {0}")]
    AlreadyExists(SceneId),

    /// A monotonic flag is already set
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unknown id combination or malformed input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("Generation timed out after {0:?}")]
    GenerationTimeout(Duration),

    #[error("Generation returned no usable content")]
    EmptyGeneration,

    /// Always fatal to the current operation
    #[error("Persistence failed: {0}")]
    Persistence(#[from] RepoError),
}

impl StoryError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::AlreadyExists(_))
    }

    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            Self::Generation(_) | Self::GenerationTimeout(_) | Self::EmptyGeneration
        )
    }

    /// Fixed narration callers may show instead of a generation error.
    pub fn fallback_message(&self) -> Option<&'static str> {
        self.is_generation_failure().then_some(FALLBACK_NARRATION)
    }
}

impl From<DomainError> for StoryError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => Self::NotFound {
                entity: entity_type,
                id,
            },
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::Validation(msg) => Self::InvalidArgument(msg),
        }
    }
}
