//! Helper types for port operations.

use branchtale_domain::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of a scene's conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    /// Node this entry narrates, if any
    pub node_id: Option<NodeId>,
    /// "narrator" for generated beats, "player" for choices
    pub speaker: String,
    pub text: String,
    pub recorded_at: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn narrator(node_id: NodeId, text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            node_id: Some(node_id),
            speaker: "narrator".to_string(),
            text: text.into(),
            recorded_at: now,
        }
    }

    pub fn player(node_id: NodeId, text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            node_id: Some(node_id),
            speaker: "player".to_string(),
            text: text.into(),
            recorded_at: now,
        }
    }
}
