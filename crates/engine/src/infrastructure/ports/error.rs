//! Port error types.
//!
//! Absence is not an error at this layer: stores answer `Ok(None)` and the use
//! cases decide whether a missing record matters.

/// Story storage and transcript failures.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// I/O or backend failure, tagged with the store operation that hit it
    #[error("Storage error in {operation}: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },

    /// A stored document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepoError {
    pub fn storage(operation: &'static str, message: impl ToString) -> Self {
        Self::Storage {
            operation,
            message: message.to_string(),
        }
    }

    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }
}

/// Generation gateway failures.
///
/// `Rejected` is a permanent refusal by the provider (bad request, auth,
/// unknown model). Everything else may succeed on a later attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("LLM request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}
