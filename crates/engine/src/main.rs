//! Branchtale - command line driver for the narrative engine.
//!
//! ```text
//! branchtale init <scene-title> <description>
//! branchtale advance <scene-id>
//! branchtale choose <scene-id> <node-id> <choice-id>
//! branchtale rewind <scene-id> <node-id>
//! branchtale show <scene-id>
//! ```
//!
//! Every command prints its result as JSON on stdout.

use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use branchtale_domain::{GenerationPreferences, SceneId, SceneInfo};
use branchtale_engine::infrastructure::settings::EngineSettings;
use branchtale_engine::use_cases::StoryError;
use branchtale_engine::App;

const USAGE: &str = "usage: branchtale <init <title> <description> | advance <scene-id> | \
choose <scene-id> <node-id> <choice-id> | rewind <scene-id> <node-id> | show <scene-id>>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root so the binary behaves the same from any crate dir.
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "branchtale_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = EngineSettings::from_env();
    let app = App::from_settings(settings);
    let prefs = GenerationPreferences::default();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["init", title, description] => {
            let scene_id = SceneId::new();
            app.register_scene(SceneInfo::new(scene_id, *title, *description))
                .await;
            let record = app
                .engine
                .initialize_story_for_scene(scene_id, &prefs)
                .await
                .map_err(surface)?;
            print_json(&record)
        }
        ["advance", scene] => {
            let update = app
                .engine
                .advance_story(parse_id(scene)?, &prefs)
                .await
                .map_err(surface)?;
            print_json(&update)
        }
        ["choose", scene, node, choice] => {
            let outcome = app
                .engine
                .make_choice(parse_id(scene)?, parse_id(node)?, parse_id(choice)?, &prefs)
                .await
                .map_err(surface)?;
            print_json(&outcome)
        }
        ["rewind", scene, node] => {
            let outcome = app
                .engine
                .rewind_to_node(parse_id(scene)?, parse_id(node)?)
                .await
                .map_err(surface)?;
            print_json(&outcome.view)
        }
        ["show", scene] => {
            let data = app
                .engine
                .get_story_data(parse_id(scene)?)
                .await
                .map_err(surface)?;
            print_json(&data)
        }
        _ => bail!(USAGE),
    }
}

fn parse_id<T>(raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse()
        .with_context(|| format!("'{}' is not a valid id", raw))
}

/// Show the fallback narration for generation failures before exiting.
fn surface(err: StoryError) -> anyhow::Error {
    if let Some(fallback) = err.fallback_message() {
        tracing::warn!(error = %err, "Generation failed");
        println!("{}", fallback);
    }
    anyhow!(err)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
