//! Engine configuration.
//!
//! Values come from environment variables (after `.env` files are loaded by the
//! binary). Unparseable values fall back to defaults with a warning rather
//! than aborting startup.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `BRANCHTALE_DATA_DIR` | `data/stories` |
//! | `OLLAMA_BASE_URL` | `http://localhost:11434` |
//! | `OLLAMA_MODEL` | `llama3.1:8b` |
//! | `BRANCHTALE_GENERATION_TIMEOUT_SECS` | `45` |
//! | `BRANCHTALE_PROGRESS_STEP` | `10` |
//! | `BRANCHTALE_TASK_COMPLETION` | `manual` |
//! | `BRANCHTALE_LLM_MAX_RETRIES` | `2` |
//! | `BRANCHTALE_LLM_ATTEMPT_TIMEOUT_SECS` | generation timeout split across attempts |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use branchtale_domain::{ProgressPolicy, TaskCompletionPolicy};
use serde::{Deserialize, Serialize};

use crate::infrastructure::ollama::{DEFAULT_OLLAMA_BASE_URL, DEFAULT_OLLAMA_MODEL};

const DEFAULT_DATA_DIR: &str = "data/stories";
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 45;
const DEFAULT_LLM_MAX_RETRIES: u32 = 2;
const DEFAULT_RECENT_NARRATION_WINDOW: usize = 4;
const MIN_LLM_ATTEMPT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    /// Directory holding one JSON file per scene
    pub data_dir: PathBuf,
    pub ollama_base_url: String,
    pub ollama_model: String,
    /// Deadline for one generation call when the caller supplies none
    pub generation_timeout_secs: u64,
    pub progress_policy: ProgressPolicy,
    pub task_completion: TaskCompletionPolicy,
    pub llm_max_retries: u32,
    /// HTTP timeout for a single gateway attempt; derived when unset
    pub llm_attempt_timeout_secs: Option<u64>,
    /// Number of path nodes quoted back to the model as recent narration
    pub recent_narration_window: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            generation_timeout_secs: DEFAULT_GENERATION_TIMEOUT_SECS,
            progress_policy: ProgressPolicy::default(),
            task_completion: TaskCompletionPolicy::default(),
            llm_max_retries: DEFAULT_LLM_MAX_RETRIES,
            llm_attempt_timeout_secs: None,
            recent_narration_window: DEFAULT_RECENT_NARRATION_WINDOW,
        }
    }
}

impl EngineSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (environment, test maps).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let progress_policy = match parse_or_warn::<u8>(&get, "BRANCHTALE_PROGRESS_STEP") {
            Some(step) => ProgressPolicy::Fixed { step },
            None => defaults.progress_policy,
        };

        let task_completion = match get("BRANCHTALE_TASK_COMPLETION") {
            Some(raw) => TaskCompletionPolicy::from_str(&raw).unwrap_or_else(|_| {
                tracing::warn!(
                    value = %raw,
                    "Unknown BRANCHTALE_TASK_COMPLETION, using manual"
                );
                TaskCompletionPolicy::Manual
            }),
            None => defaults.task_completion,
        };

        Self {
            data_dir: get("BRANCHTALE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            ollama_base_url: get("OLLAMA_BASE_URL").unwrap_or(defaults.ollama_base_url),
            ollama_model: get("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            generation_timeout_secs: parse_or_warn(&get, "BRANCHTALE_GENERATION_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.generation_timeout_secs),
            progress_policy,
            task_completion,
            llm_max_retries: parse_or_warn(&get, "BRANCHTALE_LLM_MAX_RETRIES")
                .unwrap_or(defaults.llm_max_retries),
            llm_attempt_timeout_secs: parse_or_warn(&get, "BRANCHTALE_LLM_ATTEMPT_TIMEOUT_SECS")
                .filter(|secs| *secs > 0),
            recent_narration_window: defaults.recent_narration_window,
        }
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Per-attempt HTTP timeout. Unless configured, the generation deadline
    /// is shared evenly by the first try and every retry, so a hung attempt
    /// still leaves time for the next one.
    pub fn llm_attempt_timeout_secs(&self) -> u64 {
        self.llm_attempt_timeout_secs.unwrap_or_else(|| {
            let attempts = u64::from(self.llm_max_retries) + 1;
            (self.generation_timeout_secs / attempts).max(MIN_LLM_ATTEMPT_TIMEOUT_SECS)
        })
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }
}

fn parse_or_warn<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = get(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable setting");
            None
        }
    }
}
