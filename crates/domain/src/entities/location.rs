//! Location entity - a place the player can unlock and explore.

use serde::{Deserialize, Serialize};

use branchtale_domain::{ContentSource, LocationId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Monotonic: false -> true
    #[serde(default)]
    pub accessible: bool,
    #[serde(default)]
    pub source: ContentSource,
}

impl Location {
    pub fn new(name: impl Into<String>, source: ContentSource) -> Self {
        Self {
            id: LocationId::new(),
            name: name.into(),
            description: String::new(),
            accessible: false,
            source,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn accessible(mut self) -> Self {
        self.accessible = true;
        self
    }
}
