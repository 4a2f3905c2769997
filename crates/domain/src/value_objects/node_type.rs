//! Story node kinds and content provenance tags.

use serde::{Deserialize, Serialize};

/// What kind of beat a story node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    #[default]
    Narrative,
    Dialogue,
    Choice,
    Discovery,
    Exploration,

    /// Forward-compatibility fallback for tags written by newer versions.
    #[serde(other)]
    Unknown,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Narrative => "narrative",
            Self::Dialogue => "dialogue",
            Self::Choice => "choice",
            Self::Discovery => "discovery",
            Self::Exploration => "exploration",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "narrative" | "narration" => Ok(Self::Narrative),
            "dialogue" | "dialog" => Ok(Self::Dialogue),
            "choice" | "decision" => Ok(Self::Choice),
            "discovery" | "clue" => Ok(Self::Discovery),
            "exploration" | "explore" => Ok(Self::Exploration),
            _ => Err(()),
        }
    }
}

/// Where a piece of story content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    /// Written by the scene author.
    Authored,
    /// Produced by the generation gateway.
    #[default]
    Generated,
    /// Structural fallback when a generation could not be parsed as a payload.
    Fallback,
    /// Entered by the player (e.g. a custom command).
    Player,

    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ContentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authored => write!(f, "authored"),
            Self::Generated => write!(f, "generated"),
            Self::Fallback => write!(f, "fallback"),
            Self::Player => write!(f, "player"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_loose_node_type_tags() {
        assert_eq!("Dialog".parse::<NodeType>(), Ok(NodeType::Dialogue));
        assert_eq!(" clue ".parse::<NodeType>(), Ok(NodeType::Discovery));
        assert!("montage".parse::<NodeType>().is_err());
    }

    #[test]
    fn unknown_tags_deserialize_to_unknown() {
        let parsed: NodeType = serde_json::from_str("\"flashback\"").expect("deserialize");
        assert_eq!(parsed, NodeType::Unknown);

        let source: ContentSource = serde_json::from_str("\"imported\"").expect("deserialize");
        assert_eq!(source, ContentSource::Unknown);
    }
}
