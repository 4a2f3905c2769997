//! Clue entity - textual discoveries surfaced by advancing or exploring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use branchtale_domain::{ClueId, ContentSource, LocationId, NodeId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clue {
    pub id: ClueId,
    pub text: String,
    #[serde(default)]
    pub source: ContentSource,
    pub discovered_at: DateTime<Utc>,
    /// Node whose generation produced the clue
    #[serde(default)]
    pub node_id: Option<NodeId>,
    /// Location whose exploration produced the clue
    #[serde(default)]
    pub location_id: Option<LocationId>,
}

impl Clue {
    pub fn new(text: impl Into<String>, source: ContentSource, now: DateTime<Utc>) -> Self {
        Self {
            id: ClueId::new(),
            text: text.into(),
            source,
            discovered_at: now,
            node_id: None,
            location_id: None,
        }
    }

    pub fn from_node(mut self, node_id: NodeId) -> Self {
        self.node_id = Some(node_id);
        self
    }

    pub fn from_location(mut self, location_id: LocationId) -> Self {
        self.location_id = Some(location_id);
        self
    }
}
