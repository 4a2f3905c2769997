//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Story record storage (could swap JSON files -> a database)
//! - Scene metadata and conversation transcripts (owned by other services)
//! - LLM calls (could swap Ollama -> another provider)
//! - Clock/Random (for testing)

mod error;
mod external;
mod repos;
mod testing;
pub mod types;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{ConversationLog, SceneCatalog, StoryRecordRepo};

// =============================================================================
// Types
// =============================================================================
pub use types::ConversationEntry;

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    ChatMessage, FinishReason, LlmPort, LlmRequest, LlmResponse, MessageRole, TokenUsage,
};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::{MockConversationLog, MockSceneCatalog, MockStoryRecordRepo};

#[cfg(test)]
pub use external::MockLlmPort;

#[cfg(test)]
pub use testing::{MockClockPort, MockRandomPort};

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::{ClockPort, RandomPort};

// =============================================================================
// Error Types
// =============================================================================
pub use error::{LlmError, RepoError};
