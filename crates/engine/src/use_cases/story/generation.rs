//! Generation orchestration.
//!
//! Builds prompts from story context, calls the Generation Gateway under a
//! deadline, and turns the reply into typed payloads. Replies are expected to
//! be JSON; the first JSON object in the text is used (fenced or bare), and
//! unstructured replies become plain narration.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use branchtale_domain::{
    Choice, ContentSource, GenerationPreferences, Location, NodeId, NodeType, SceneInfo,
    StoryNode, StoryRecord, Task,
};
use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::StoryError;
use crate::infrastructure::ports::{LlmPort, LlmRequest};
use crate::prompt_templates::{keys, render, resolve};

// =============================================================================
// Payloads
// =============================================================================

/// A generated choice. Accepts the full object or a bare string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawChoice")]
pub struct ChoicePayload {
    pub text: String,
    pub consequence: String,
    pub choice_type: Option<String>,
    pub impact: i32,
    pub hint: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawChoice {
    Text(String),
    Full(FullChoice),
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FullChoice {
    #[serde(deserialize_with = "lenient_string")]
    text: String,
    #[serde(deserialize_with = "lenient_string")]
    consequence: String,
    #[serde(rename = "type", deserialize_with = "lenient_opt_string")]
    choice_type: Option<String>,
    #[serde(deserialize_with = "lenient_impact")]
    impact: i32,
    #[serde(deserialize_with = "lenient_opt_string")]
    hint: Option<String>,
}

impl From<RawChoice> for ChoicePayload {
    fn from(raw: RawChoice) -> Self {
        match raw {
            RawChoice::Text(text) => Self {
                text,
                ..Self::default()
            },
            RawChoice::Full(full) => Self {
                text: full.text,
                consequence: full.consequence,
                choice_type: full.choice_type,
                impact: full.impact,
                hint: full.hint,
            },
        }
    }
}

/// Any number, rounded; numeric strings parse; anything else is 0.
fn lenient_impact<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let impact = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(impact
        .filter(|n| n.is_finite())
        .map(|n| n.round() as i32)
        .unwrap_or_default())
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

/// Strings pass through, scalars are stringified, anything else is dropped.
fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskPayload {
    pub title: String,
    pub description: String,
    pub reward: String,
    pub objectives: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationPayload {
    pub name: String,
    pub description: String,
    pub accessible: bool,
}

/// Opening of a new story.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpeningPayload {
    pub intro: String,
    pub main_objective: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub choices: Vec<ChoicePayload>,
    pub tasks: Vec<TaskPayload>,
    pub locations: Vec<LocationPayload>,
}

/// One generated story beat.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BeatPayload {
    pub title: Option<String>,
    pub content: String,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub choices: Vec<ChoicePayload>,
    pub new_task: Option<TaskPayload>,
    pub new_clue: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePayload {
    pub title: Option<String>,
    pub content: String,
}

/// Result of exploring a location.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExplorationPayload {
    pub description: String,
    pub item: Option<String>,
    pub clue: Option<String>,
    pub node: Option<NodePayload>,
}

impl ChoicePayload {
    pub fn into_choice(self, order: u32) -> Choice {
        let mut choice = Choice::new(self.text.trim())
            .with_consequence(self.consequence)
            .with_impact(self.impact)
            .with_order(order);
        if let Some(kind) = self.choice_type.filter(|t| !t.trim().is_empty()) {
            choice = choice.with_type(kind);
        }
        if let Some(hint) = self.hint.filter(|h| !h.trim().is_empty()) {
            choice = choice.with_hint(hint);
        }
        choice
    }
}

/// Convert payload choices, dropping blank ones.
pub fn build_choices(choices: Vec<ChoicePayload>) -> Vec<Choice> {
    choices
        .into_iter()
        .filter(|c| !c.text.trim().is_empty())
        .enumerate()
        .map(|(i, c)| c.into_choice(i as u32))
        .collect()
}

impl TaskPayload {
    /// `None` for payloads without a title.
    pub fn into_task(self, source: ContentSource) -> Option<Task> {
        if self.title.trim().is_empty() {
            return None;
        }
        let mut task = Task::new(self.title.trim(), source)
            .with_description(self.description)
            .with_reward(self.reward);
        for objective in self.objectives.into_iter().filter(|o| !o.trim().is_empty()) {
            task = task.with_objective(objective);
        }
        Some(task)
    }
}

impl LocationPayload {
    pub fn into_location(self, source: ContentSource) -> Option<Location> {
        if self.name.trim().is_empty() {
            return None;
        }
        let location = Location::new(self.name.trim(), source).with_description(self.description);
        Some(if self.accessible {
            location.accessible()
        } else {
            location
        })
    }
}

impl BeatPayload {
    /// Build the node this beat describes.
    pub fn to_node(&self, parent_id: NodeId, now: DateTime<Utc>) -> StoryNode {
        let node_type = self
            .node_type
            .as_deref()
            .and_then(|t| NodeType::from_str(t).ok())
            .unwrap_or_default();
        let mut node = StoryNode::new(
            Some(parent_id),
            node_type,
            self.content.trim(),
            ContentSource::Generated,
            now,
        )
        .with_choices(build_choices(self.choices.clone()));
        if let Some(title) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            node = node.with_title(title.trim());
        }
        node
    }
}

// =============================================================================
// Context
// =============================================================================

/// Story context quoted back to the model.
#[derive(Debug, Clone, Default)]
pub struct StoryContext {
    pub intro: String,
    pub main_objective: String,
    pub current_state: String,
    /// Path narration, oldest first
    pub recent: Vec<String>,
    /// Authored baseline of the node being continued
    pub grounding: String,
}

impl StoryContext {
    /// Context for continuing from `anchor`: up to `window` nodes of its
    /// ancestry (anchor included), oldest first.
    pub fn for_anchor(record: &StoryRecord, anchor: &StoryNode, window: usize) -> Self {
        let mut recent = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(anchor);
        while let Some(node) = current {
            if recent.len() >= window || !seen.insert(node.id) {
                break;
            }
            recent.push(node.content.clone());
            current = node.parent_id.and_then(|id| record.node(id));
        }
        recent.reverse();

        Self {
            intro: record.intro().to_string(),
            main_objective: record.main_objective().to_string(),
            current_state: record.current_state().to_string(),
            recent,
            grounding: anchor.grounding_text().to_string(),
        }
    }

    /// Context for continuing the current path from its leaf.
    pub fn for_current_leaf(record: &StoryRecord, window: usize) -> Self {
        Self {
            intro: record.intro().to_string(),
            main_objective: record.main_objective().to_string(),
            current_state: record.current_state().to_string(),
            recent: record
                .recent_narration(window)
                .into_iter()
                .map(str::to_string)
                .collect(),
            grounding: record
                .current_leaf()
                .map(|leaf| leaf.grounding_text().to_string())
                .unwrap_or_default(),
        }
    }

    fn recent_block(&self) -> String {
        if self.recent.is_empty() {
            "(nothing yet)".to_string()
        } else {
            self.recent
                .iter()
                .map(|line| format!("- {}", line.trim()))
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

// =============================================================================
// Generator
// =============================================================================

pub struct StoryGenerator {
    llm: Arc<dyn LlmPort>,
    default_timeout: Duration,
}

impl StoryGenerator {
    pub fn new(llm: Arc<dyn LlmPort>, default_timeout: Duration) -> Self {
        Self {
            llm,
            default_timeout,
        }
    }

    pub async fn opening(
        &self,
        scene: &SceneInfo,
        prefs: &GenerationPreferences,
    ) -> Result<OpeningPayload, StoryError> {
        let prompt = render(
            &resolve(keys::STORY_INIT),
            &[("title", &scene.title), ("description", &scene.description)],
        );
        let text = self.complete(prompt, prefs).await?;
        Ok(parse_payload::<OpeningPayload>(&text).unwrap_or_else(|| {
            let loose = LooseReply::from_text(&text);
            OpeningPayload {
                intro: loose.field("intro").unwrap_or_default(),
                main_objective: loose.field("mainObjective").unwrap_or_default(),
                title: loose.field("title"),
                content: Some(loose.body("content")),
                ..OpeningPayload::default()
            }
        }))
    }

    pub async fn beat(
        &self,
        context: &StoryContext,
        prefs: &GenerationPreferences,
    ) -> Result<BeatPayload, StoryError> {
        let prompt = render(
            &resolve(keys::STORY_BEAT),
            &[
                ("intro", &context.intro),
                ("objective", &context.main_objective),
                ("state", &context.current_state),
                ("recent", &context.recent_block()),
                ("grounding", &context.grounding),
            ],
        );
        let text = self.complete(prompt, prefs).await?;
        beat_from_text(&text)
    }

    pub async fn choice_outcome(
        &self,
        context: &StoryContext,
        choice: &Choice,
        prefs: &GenerationPreferences,
    ) -> Result<BeatPayload, StoryError> {
        let hint = choice
            .next_node_hint
            .as_deref()
            .map(|h| format!("DIRECTION HINT: {}", h))
            .unwrap_or_default();
        let prompt = render(
            &resolve(keys::STORY_CHOICE),
            &[
                ("objective", &context.main_objective),
                ("recent", &context.recent_block()),
                ("grounding", &context.grounding),
                ("choice", &choice.text),
                ("consequence", &choice.consequence),
                ("hint", &hint),
            ],
        );
        let text = self.complete(prompt, prefs).await?;
        beat_from_text(&text)
    }

    pub async fn exploration(
        &self,
        context: &StoryContext,
        location: &Location,
        prefs: &GenerationPreferences,
    ) -> Result<ExplorationPayload, StoryError> {
        let prompt = render(
            &resolve(keys::STORY_EXPLORATION),
            &[
                ("objective", &context.main_objective),
                ("location", &location.name),
                ("location_description", &location.description),
                ("recent", &context.recent_block()),
            ],
        );
        let text = self.complete(prompt, prefs).await?;
        let payload = parse_payload::<ExplorationPayload>(&text).unwrap_or_else(|| {
            let loose = LooseReply::from_text(&text);
            ExplorationPayload {
                description: loose.body("description"),
                item: loose.field("item"),
                clue: loose.field("clue"),
                node: None,
            }
        });
        if payload.description.trim().is_empty() {
            return Err(StoryError::EmptyGeneration);
        }
        Ok(payload)
    }

    /// One gateway call under the caller's deadline (or the engine default).
    async fn complete(
        &self,
        prompt: String,
        prefs: &GenerationPreferences,
    ) -> Result<String, StoryError> {
        let twists = if prefs.allow_plot_twists {
            "Unexpected reversals and plot twists are welcome."
        } else {
            "Avoid abrupt plot twists; keep developments grounded."
        };
        let system = render(&resolve(keys::STORY_SYSTEM_PROMPT), &[("twists", twists)]);
        let request = LlmRequest::prompt(prompt)
            .with_system_prompt(system)
            .with_temperature(prefs.temperature())
            .with_max_tokens(prefs.max_tokens);

        let deadline = prefs.timeout().unwrap_or(self.default_timeout);
        let response = match tokio::time::timeout(deadline, self.llm.generate(request)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(timeout_ms = deadline.as_millis() as u64, "Generation timed out");
                return Err(StoryError::GenerationTimeout(deadline));
            }
        };

        if response.is_truncated() {
            tracing::warn!(
                chars = response.content.len(),
                "Generation hit the token budget; payload may be cut short"
            );
        }
        if response.content.trim().is_empty() {
            return Err(StoryError::EmptyGeneration);
        }
        Ok(response.content)
    }
}

fn beat_from_text(text: &str) -> Result<BeatPayload, StoryError> {
    let payload = parse_payload::<BeatPayload>(text).unwrap_or_else(|| {
        let loose = LooseReply::from_text(text);
        BeatPayload {
            title: loose.field("title"),
            content: loose.body("content"),
            node_type: loose.field("type"),
            choices: loose.choices(),
            new_clue: loose.field("newClue"),
            ..BeatPayload::default()
        }
    });
    if payload.content.trim().is_empty() {
        return Err(StoryError::EmptyGeneration);
    }
    Ok(payload)
}

// =============================================================================
// Parsing
// =============================================================================

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("valid regex"));

/// The first JSON object in `text`, fenced or bare.
fn first_object(text: &str) -> Option<Value> {
    let body = JSON_FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);
    let start = body.find('{')?;
    let value = serde_json::Deserializer::from_str(&body[start..])
        .into_iter::<Value>()
        .next()?
        .ok()?;
    value.is_object().then_some(value)
}

/// Extract and decode the first JSON object in `text`.
pub fn parse_payload<T: DeserializeOwned>(text: &str) -> Option<T> {
    match serde_json::from_value(first_object(text)?) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::debug!(error = %e, "Generation JSON did not match the expected payload");
            None
        }
    }
}

/// Field-by-field view of a reply that did not decode as a whole payload.
/// Keeps the JSON object out of player-facing text.
struct LooseReply<'a> {
    text: &'a str,
    object: Option<Value>,
}

impl<'a> LooseReply<'a> {
    fn from_text(text: &'a str) -> Self {
        Self {
            text,
            object: first_object(text),
        }
    }

    fn field(&self, key: &str) -> Option<String> {
        self.object
            .as_ref()?
            .get(key)?
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// The named text field of a JSON reply, or the whole text for prose.
    fn body(&self, key: &str) -> String {
        match &self.object {
            Some(_) => self.field(key).unwrap_or_default(),
            None => self.text.trim().to_string(),
        }
    }

    /// Choices that decode on their own; malformed entries are skipped.
    fn choices(&self) -> Vec<ChoicePayload> {
        self.object
            .as_ref()
            .and_then(|o| o.get("choices"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchtale_domain::SceneId;

    use crate::infrastructure::ports::{LlmError, LlmResponse, MockLlmPort};

    #[test]
    fn parses_fenced_json() {
        let text = "Sure!\n```json\n{\"content\": \"The bell tolls.\", \"newClue\": \"A bronze key\"}\n```\nEnjoy.";
        let beat: BeatPayload = parse_payload(text).unwrap();
        assert_eq!(beat.content, "The bell tolls.");
        assert_eq!(beat.new_clue.as_deref(), Some("A bronze key"));
    }

    #[test]
    fn parses_first_object_and_ignores_trailing_text() {
        let text = r#"{"content": "First."} {"content": "Second."}"#;
        let beat: BeatPayload = parse_payload(text).unwrap();
        assert_eq!(beat.content, "First.");
    }

    #[test]
    fn plain_prose_becomes_content() {
        let beat = beat_from_text("  The corridor narrows.  ").unwrap();
        assert_eq!(beat.content, "The corridor narrows.");
        assert!(beat.choices.is_empty());
    }

    #[test]
    fn json_without_content_is_empty_generation() {
        assert!(matches!(
            beat_from_text(r#"{"title": "Nothing"}"#),
            Err(StoryError::EmptyGeneration)
        ));
    }

    #[test]
    fn beat_builds_node_with_ordered_choices() {
        let beat: BeatPayload = parse_payload(
            r#"{"title": "Gate", "content": "A gate.", "type": "discovery",
                "choices": [{"text": "Open"}, {"text": "  "}, {"text": "Leave", "impact": 3}]}"#,
        )
        .unwrap();
        let parent = NodeId::new();
        let node = beat.to_node(parent, Utc::now());

        assert_eq!(node.parent_id, Some(parent));
        assert_eq!(node.node_type, NodeType::Discovery);
        assert_eq!(node.title, "Gate");
        let orders: Vec<_> = node.choices.iter().map(|c| (c.text.as_str(), c.order)).collect();
        assert_eq!(orders, vec![("Open", 0), ("Leave", 1)]);
    }

    #[test]
    fn bare_string_choices_keep_title_and_choices() {
        let beat = beat_from_text(
            r#"{"title":"Bell","content":"The bell tolls.","choices":["Ring it","Leave"]}"#,
        )
        .unwrap();
        assert_eq!(beat.title.as_deref(), Some("Bell"));
        assert_eq!(beat.content, "The bell tolls.");
        let texts: Vec<_> = beat.choices.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Ring it", "Leave"]);
    }

    #[test]
    fn float_and_string_impacts_are_rounded() {
        let beat = beat_from_text(
            r#"{"content": "A fork.", "choices": [
                {"text": "Left", "impact": 2.5},
                {"text": "Right", "impact": "-1"},
                {"text": "Wait", "impact": "a lot"}]}"#,
        )
        .unwrap();
        let impacts: Vec<_> = beat.choices.iter().map(|c| c.impact).collect();
        assert_eq!(impacts, vec![3, -1, 0]);
    }

    #[test]
    fn mistyped_fields_never_leak_json_into_content() {
        let beat = beat_from_text(
            r#"{"title": "Gate", "content": "A gate.", "newTask": "not an object",
                "choices": [{"text": "Open"}, 42]}"#,
        )
        .unwrap();
        assert_eq!(beat.content, "A gate.");
        assert_eq!(beat.title.as_deref(), Some("Gate"));
        assert_eq!(beat.choices.len(), 1);
        assert!(beat.new_task.is_none());
    }

    #[tokio::test]
    async fn opening_and_exploration_fall_back_to_their_text_fields() {
        let mut llm = MockLlmPort::new();
        let mut replies = vec![
            r#"{"intro": "Fog.", "mainObjective": "Find the heir", "content": "Dawn.", "tasks": "none"}"#,
            r#"{"description": "Dusty shelves.", "clue": "A torn map", "node": 7}"#,
        ]
        .into_iter();
        llm.expect_generate()
            .times(2)
            .returning(move |_| Ok(LlmResponse::text(replies.next().unwrap_or_default())));
        let generator = StoryGenerator::new(Arc::new(llm), Duration::from_secs(5));
        let prefs = GenerationPreferences::default();

        let scene = SceneInfo::new(SceneId::new(), "Harbor", "A foggy harbor");
        let opening = generator.opening(&scene, &prefs).await.unwrap();
        assert_eq!(opening.intro, "Fog.");
        assert_eq!(opening.main_objective, "Find the heir");
        assert_eq!(opening.content.as_deref(), Some("Dawn."));

        let library = Location::new("Library", ContentSource::Generated);
        let found = generator
            .exploration(&StoryContext::default(), &library, &prefs)
            .await
            .unwrap();
        assert_eq!(found.description, "Dusty shelves.");
        assert_eq!(found.clue.as_deref(), Some("A torn map"));
    }

    #[test]
    fn current_leaf_context_matches_anchor_context() {
        let now = Utc::now();
        let root = StoryNode::new(
            None,
            NodeType::Narrative,
            "Fog rolls in.",
            ContentSource::Authored,
            now,
        );
        let root_id = root.id;
        let mut record = StoryRecord::new(SceneId::new(), "Harbor", "Find the heir", root, now);
        let next = StoryNode::new(
            Some(root_id),
            NodeType::Narrative,
            "A bell rings.",
            ContentSource::Generated,
            now + chrono::Duration::seconds(1),
        );
        record.append_node(next.clone()).unwrap();

        let context = StoryContext::for_current_leaf(&record, 4);
        let anchored = StoryContext::for_anchor(&record, &next, 4);
        assert_eq!(context.recent, vec!["Fog rolls in.", "A bell rings."]);
        assert_eq!(context.recent, anchored.recent);
        assert_eq!(context.grounding, anchored.grounding);
        assert_eq!(StoryContext::for_current_leaf(&record, 1).recent, vec!["A bell rings."]);
    }

    #[test]
    fn task_payload_without_title_is_ignored() {
        assert!(TaskPayload::default().into_task(ContentSource::Generated).is_none());
        let task = TaskPayload {
            title: "Find the heir".into(),
            objectives: vec!["Ask the priest".into(), "".into()],
            ..TaskPayload::default()
        }
        .into_task(ContentSource::Generated)
        .unwrap();
        assert_eq!(task.objectives.len(), 1);
    }

    #[tokio::test]
    async fn request_carries_temperature_and_max_tokens() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .withf(|req| {
                req.temperature.is_some_and(|t| (t - 1.2).abs() < 1e-6)
                    && req.max_tokens == Some(64)
                    && req
                        .system_prompt
                        .as_deref()
                        .is_some_and(|s| s.contains("twists are welcome"))
            })
            .returning(|_| Ok(LlmResponse::text(r#"{"content": "Lightning."}"#)));

        let generator = StoryGenerator::new(Arc::new(llm), Duration::from_secs(5));
        let prefs = GenerationPreferences::default()
            .with_creativity(1.0)
            .with_plot_twists(true)
            .with_max_tokens(Some(64));
        let beat = generator.beat(&StoryContext::default(), &prefs).await.unwrap();
        assert_eq!(beat.content, "Lightning.");
    }

    #[tokio::test]
    async fn gateway_errors_propagate() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .returning(|_| Err(LlmError::RequestFailed("connection refused".into())));
        let generator = StoryGenerator::new(Arc::new(llm), Duration::from_secs(5));

        let err = generator
            .beat(&StoryContext::default(), &GenerationPreferences::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoryError::Generation(_)));
        assert!(err.fallback_message().is_some());
    }

    #[tokio::test]
    async fn blank_reply_is_empty_generation() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .returning(|_| Ok(LlmResponse::text("   ")));
        let generator = StoryGenerator::new(Arc::new(llm), Duration::from_secs(5));

        let err = generator
            .beat(&StoryContext::default(), &GenerationPreferences::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoryError::EmptyGeneration));
    }
}
