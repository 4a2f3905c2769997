//! Sampling preferences forwarded to the generation gateway.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lowest temperature handed to the gateway (creativity 0.0).
const MIN_TEMPERATURE: f32 = 0.2;
/// Temperature span covered by creativity 0.0..=1.0.
const TEMPERATURE_SPAN: f32 = 1.0;

/// Player/caller preferences for one generation-backed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationPreferences {
    /// 0.0 (conservative) to 1.0 (wild). Values outside the range are clamped.
    pub creativity_level: f32,
    /// Whether the narrator may introduce unexpected reversals.
    pub allow_plot_twists: bool,
    /// Upper bound on generated tokens; `None` lets the gateway decide.
    pub max_tokens: Option<u32>,
    /// Caller-supplied deadline in seconds; `None` uses the engine default.
    pub timeout_secs: Option<u64>,
}

impl Default for GenerationPreferences {
    fn default() -> Self {
        Self {
            creativity_level: 0.5,
            allow_plot_twists: false,
            max_tokens: Some(800),
            timeout_secs: None,
        }
    }
}

impl GenerationPreferences {
    pub fn with_creativity(mut self, level: f32) -> Self {
        self.creativity_level = level;
        self
    }

    pub fn with_plot_twists(mut self, allow: bool) -> Self {
        self.allow_plot_twists = allow;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs().max(1));
        self
    }

    /// Sampling temperature derived from the creativity level.
    pub fn temperature(&self) -> f32 {
        let level = if self.creativity_level.is_finite() {
            self.creativity_level.clamp(0.0, 1.0)
        } else {
            0.5
        };
        MIN_TEMPERATURE + level * TEMPERATURE_SPAN
    }

    /// The caller's deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
