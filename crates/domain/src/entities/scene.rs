//! Scene metadata supplied by the scene catalog.
//!
//! The engine only reads a scene's title and authored description to seed
//! the opening generation; scene ownership lives elsewhere.

use serde::{Deserialize, Serialize};

use branchtale_domain::SceneId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneInfo {
    pub id: SceneId,
    pub title: String,
    pub description: String,
}

impl SceneInfo {
    pub fn new(id: SceneId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
        }
    }
}
