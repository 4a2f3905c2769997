//! Branchtale Engine library.
//!
//! The narrative state engine: per-scene story records, their mutation rules,
//! and the generation calls that extend them.
//!
//! ## Structure
//!
//! - `use_cases/` - Story operations (advance, choose, rewind, ...)
//! - `infrastructure/` - Port traits and their adapters (files, Ollama, clock)
//! - `stores/` - In-process state shared across use cases (scene locks)
//! - `prompt_templates` - Generation prompts with environment overrides
//! - `app` - Application composition and the engine facade

pub mod app;
pub mod infrastructure;
pub mod prompt_templates;
pub mod stores;
pub mod use_cases;

pub use app::{App, NarrativeEngine};
