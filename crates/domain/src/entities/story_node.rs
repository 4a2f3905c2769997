//! Story node entity - one beat of narrative content.
//!
//! Nodes are stored flat inside a [`StoryRecord`](crate::aggregates::StoryRecord)
//! and linked to their predecessor through `parent_id`. They are never removed:
//! hidden nodes have `is_revealed = false` and rewound nodes are `superseded`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use branchtale_domain::{ChoiceId, ContentSource, NodeId, NodeType};

/// Metadata key recording when a choice was selected (RFC 3339).
pub const SELECTED_AT_KEY: &str = "selectedAt";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryNode {
    pub id: NodeId,
    /// `None` for a root node
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    #[serde(default)]
    pub title: String,
    /// Display text, possibly generated
    pub content: String,
    /// Authored baseline used to ground generation
    #[serde(default)]
    pub original_content: String,
    #[serde(default = "default_true")]
    pub is_revealed: bool,
    /// Set by rewind for nodes created after the rewind target
    #[serde(default)]
    pub superseded: bool,
    #[serde(default)]
    pub source: ContentSource,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

fn default_true() -> bool {
    true
}

impl StoryNode {
    pub fn new(
        parent_id: Option<NodeId>,
        node_type: NodeType,
        content: impl Into<String>,
        source: ContentSource,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NodeId::new(),
            parent_id,
            node_type,
            title: String::new(),
            content: content.into(),
            original_content: String::new(),
            is_revealed: true,
            superseded: false,
            source,
            created_at: now,
            choices: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = id;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_original_content(mut self, original: impl Into<String>) -> Self {
        self.original_content = original.into();
        self
    }

    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_revealed = false;
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Revealed and not rewound away: eligible for the current path.
    pub fn is_live(&self) -> bool {
        self.is_revealed && !self.superseded
    }

    pub fn choice(&self, choice_id: ChoiceId) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }

    pub fn choice_mut(&mut self, choice_id: ChoiceId) -> Option<&mut Choice> {
        self.choices.iter_mut().find(|c| c.id == choice_id)
    }

    pub fn selected_choice(&self) -> Option<&Choice> {
        self.choices.iter().find(|c| c.selected)
    }

    pub fn has_selection(&self) -> bool {
        self.choices.iter().any(|c| c.selected)
    }

    /// Text used as generation grounding: the authored baseline when present.
    pub fn grounding_text(&self) -> &str {
        if self.original_content.trim().is_empty() {
            &self.content
        } else {
            &self.original_content
        }
    }
}

/// A selectable option attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub id: ChoiceId,
    pub text: String,
    #[serde(default)]
    pub consequence: String,
    /// Resolved target node, once one exists
    #[serde(default)]
    pub next_node_id: Option<NodeId>,
    /// Free-text hint for synthesizing the target node
    #[serde(default)]
    pub next_node_hint: Option<String>,
    /// Monotonic: false -> true, never back
    #[serde(default)]
    pub selected: bool,
    #[serde(rename = "type", default = "default_choice_type")]
    pub choice_type: String,
    #[serde(default)]
    pub impact: i32,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

fn default_choice_type() -> String {
    "action".to_string()
}

impl Choice {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: ChoiceId::new(),
            text: text.into(),
            consequence: String::new(),
            next_node_id: None,
            next_node_hint: None,
            selected: false,
            choice_type: default_choice_type(),
            impact: 0,
            order: 0,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_consequence(mut self, consequence: impl Into<String>) -> Self {
        self.consequence = consequence.into();
        self
    }

    pub fn with_next_node(mut self, node_id: NodeId) -> Self {
        self.next_node_id = Some(node_id);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.next_node_hint = Some(hint.into());
        self
    }

    pub fn with_type(mut self, choice_type: impl Into<String>) -> Self {
        self.choice_type = choice_type.into();
        self
    }

    pub fn with_impact(mut self, impact: i32) -> Self {
        self.impact = impact;
        self
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }
}

/// Order choices for presentation: ascending `order`, then descending `impact`.
pub fn sort_choices_for_display(choices: &mut [Choice]) {
    choices.sort_by(|a, b| a.order.cmp(&b.order).then(b.impact.cmp(&a.impact)));
}
