//! Engine policies that the observable contract leaves open.
//!
//! Both policies are plain data so they can live in settings files and be
//! swapped per deployment. Randomness is injected via closure to keep the
//! domain free of an RNG dependency.

use serde::{Deserialize, Serialize};

/// Maximum story progress.
pub const MAX_PROGRESS: u8 = 100;

/// How much `progress` grows per advanced beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressPolicy {
    /// Always add `step`.
    Fixed { step: u8 },
    /// Add a value drawn uniformly from `min..=max`.
    Random { min: u8, max: u8 },
}

impl Default for ProgressPolicy {
    fn default() -> Self {
        Self::Fixed { step: 10 }
    }
}

impl ProgressPolicy {
    /// Compute the next increment. `roll(min, max)` must return a value in
    /// `min..=max`; out-of-range results are clamped.
    pub fn increment(&self, roll: impl FnOnce(i32, i32) -> i32) -> u8 {
        match *self {
            Self::Fixed { step } => step,
            Self::Random { min, max } => {
                let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
                let rolled = roll(i32::from(lo), i32::from(hi));
                rolled.clamp(i32::from(lo), i32::from(hi)) as u8
            }
        }
    }
}

/// Whether completing objectives completes their parent task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCompletionPolicy {
    /// Tasks complete only through an explicit `CompleteTask`.
    #[default]
    Manual,
    /// Completing the last open objective also completes the task.
    AllObjectives,
}

impl std::str::FromStr for TaskCompletionPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "all_objectives" | "allobjectives" | "auto" => Ok(Self::AllObjectives),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for TaskCompletionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::AllObjectives => write!(f, "all_objectives"),
        }
    }
}
