//! Configurable LLM prompt templates used by the story engine.
//!
//! Every template has a hard-coded default and can be overridden through an
//! environment variable derived from its key (see [`key_to_env_var`]).
//! Templates use `{name}` placeholders filled by [`render`].

use std::borrow::Cow;

/// All prompt template keys as constants.
pub mod keys {
    /// Narrator persona shared by every story generation.
    pub const STORY_SYSTEM_PROMPT: &str = "story.system_prompt";
    /// Opening of a new story for a scene.
    pub const STORY_INIT: &str = "story.init";
    /// Next beat continuing the current path.
    pub const STORY_BEAT: &str = "story.beat";
    /// Node reached by selecting a choice that has no target yet.
    pub const STORY_CHOICE: &str = "story.choice";
    /// Description of an explored location.
    pub const STORY_EXPLORATION: &str = "story.exploration";
}

/// Default values for all prompt templates.
pub mod defaults {
    pub const STORY_SYSTEM_PROMPT: &str = r#"You are the narrator of an interactive, branching story.
Write vivid but concise second-person prose (2-4 short paragraphs at most).
Stay consistent with everything that already happened. Never decide for the player.
{twists}
Always answer with a single JSON object and nothing else."#;

    pub const STORY_INIT: &str = r#"Start a new story for this scene.

SCENE TITLE: {title}
SCENE DESCRIPTION:
{description}

Respond with JSON:
{
  "intro": "one paragraph setting the stage",
  "mainObjective": "what the player is ultimately trying to achieve",
  "title": "title of the opening beat",
  "content": "the opening narration",
  "choices": [{"text": "...", "consequence": "...", "type": "action", "impact": 1}],
  "tasks": [{"title": "...", "description": "...", "objectives": ["..."]}],
  "locations": [{"name": "...", "description": "...", "accessible": true}]
}"#;

    pub const STORY_BEAT: &str = r#"Continue the story from where it stands.

STORY SO FAR:
{intro}
MAIN OBJECTIVE: {objective}
CURRENT STATE: {state}

RECENT NARRATION (oldest first):
{recent}

SOURCE TEXT OF THE CURRENT BEAT:
{grounding}

Respond with JSON:
{
  "title": "short beat title",
  "content": "the next narration",
  "type": "narrative | dialogue | discovery",
  "choices": [{"text": "...", "consequence": "...", "type": "action", "impact": 1}],
  "newTask": {"title": "...", "description": "...", "objectives": ["..."]},
  "newClue": "optional clue text"
}
Omit "newTask" and "newClue" unless the story genuinely introduces them."#;

    pub const STORY_CHOICE: &str = r#"The player made a choice. Narrate what happens next.

MAIN OBJECTIVE: {objective}

RECENT NARRATION (oldest first):
{recent}

SOURCE TEXT OF THE CURRENT BEAT:
{grounding}

PLAYER CHOICE: {choice}
EXPECTED CONSEQUENCE: {consequence}
{hint}

Respond with JSON:
{
  "title": "short beat title",
  "content": "the narration that follows the choice",
  "type": "narrative | dialogue | discovery",
  "choices": [{"text": "...", "consequence": "...", "type": "action", "impact": 1}],
  "newTask": {"title": "...", "description": "...", "objectives": ["..."]},
  "newClue": "optional clue text"
}"#;

    pub const STORY_EXPLORATION: &str = r#"The player explores a location.

MAIN OBJECTIVE: {objective}
LOCATION: {location}
LOCATION DESCRIPTION:
{location_description}

RECENT NARRATION (oldest first):
{recent}

Respond with JSON:
{
  "description": "what the player finds and feels here",
  "item": "optional item picked up",
  "clue": "optional clue text",
  "node": {"title": "...", "content": "optional story beat triggered by the exploration"}
}"#;
}

/// Convert a template key to its environment variable name.
pub fn key_to_env_var(key: &str) -> String {
    format!("BRANCHTALE_PROMPT_{}", key.to_uppercase().replace('.', "_"))
}

/// Get the default value for a template key.
pub fn get_default(key: &str) -> Option<&'static str> {
    match key {
        keys::STORY_SYSTEM_PROMPT => Some(defaults::STORY_SYSTEM_PROMPT),
        keys::STORY_INIT => Some(defaults::STORY_INIT),
        keys::STORY_BEAT => Some(defaults::STORY_BEAT),
        keys::STORY_CHOICE => Some(defaults::STORY_CHOICE),
        keys::STORY_EXPLORATION => Some(defaults::STORY_EXPLORATION),
        _ => None,
    }
}

/// Get all known template keys.
pub fn all_keys() -> Vec<&'static str> {
    vec![
        keys::STORY_SYSTEM_PROMPT,
        keys::STORY_INIT,
        keys::STORY_BEAT,
        keys::STORY_CHOICE,
        keys::STORY_EXPLORATION,
    ]
}

/// Resolve a template: environment override first, then the default.
pub fn resolve(key: &str) -> Cow<'static, str> {
    resolve_with(key, |var| std::env::var(var).ok())
}

pub fn resolve_with(key: &str, lookup: impl Fn(&str) -> Option<String>) -> Cow<'static, str> {
    if let Some(value) = lookup(&key_to_env_var(key)).filter(|v| !v.trim().is_empty()) {
        return Cow::Owned(value);
    }
    match get_default(key) {
        Some(default) => Cow::Borrowed(default),
        None => {
            tracing::warn!(key, "Unknown prompt template key");
            Cow::Borrowed("")
        }
    }
}

/// Replace `{name}` placeholders. Unknown placeholders are left untouched.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{}}}", name), value);
    }
    out
}
