//! Application state and composition.

use std::sync::Arc;

use branchtale_domain::{
    build_branch_tree_with, BatchOperation, BranchView, BranchViewOptions, Choice, ChoiceId,
    DomainError, GenerationPreferences, Location, LocationId, NodeId, ObjectiveId, SceneId,
    SceneInfo, StoryRecord, StoryRecordChange, Task, TaskId,
};

use crate::infrastructure::{
    clock::{SystemClock, SystemRandom},
    ollama::OllamaClient,
    persistence::{FileStoryStore, InMemoryConversationLog, InMemorySceneCatalog},
    ports::LlmPort,
    resilient_llm::{ResilientLlmClient, RetryConfig},
    settings::EngineSettings,
};
use crate::stores::SceneLocks;
use crate::use_cases::story::{
    ChoiceOutcome, ExplorationResult, RewindOutcome, StoryData, StoryError, StoryPorts,
    StoryUpdate, StoryUseCases,
};

/// Main application state.
///
/// Owns the engine plus the in-process collaborators it was wired with.
pub struct App {
    pub engine: Arc<NarrativeEngine>,
    /// Scene metadata known to this process
    pub scenes: InMemorySceneCatalog,
    pub conversation: InMemoryConversationLog,
    pub settings: EngineSettings,
}

impl App {
    /// Wire the engine with JSON file storage and an Ollama gateway.
    pub fn from_settings(settings: EngineSettings) -> Self {
        let ollama = Arc::new(OllamaClient::with_timeout(
            &settings.ollama_base_url,
            &settings.ollama_model,
            settings.llm_attempt_timeout_secs(),
        ));
        let retry_config = RetryConfig::default().with_max_retries(settings.llm_max_retries);
        tracing::info!(
            model = ollama.model(),
            max_retries = retry_config.max_retries,
            attempt_timeout_secs = settings.llm_attempt_timeout_secs(),
            base_delay_ms = retry_config.base_delay_ms,
            "LLM client configured"
        );
        let llm: Arc<dyn LlmPort> = Arc::new(ResilientLlmClient::new(ollama, retry_config));

        Self::with_llm(settings, llm)
    }

    /// Wire the engine with JSON file storage and the given gateway.
    pub fn with_llm(settings: EngineSettings, llm: Arc<dyn LlmPort>) -> Self {
        let scenes = InMemorySceneCatalog::new();
        let conversation = InMemoryConversationLog::new();
        tracing::info!(data_dir = %settings.data_dir.display(), "Using file story store");

        let ports = StoryPorts {
            repo: Arc::new(FileStoryStore::new(settings.data_dir.clone())),
            scenes: Arc::new(scenes.clone()),
            conversation: Arc::new(conversation.clone()),
            llm,
            clock: Arc::new(SystemClock),
            random: Arc::new(SystemRandom),
            locks: Arc::new(SceneLocks::new()),
        };

        Self {
            engine: Arc::new(NarrativeEngine::new(StoryUseCases::new(ports, &settings))),
            scenes,
            conversation,
            settings,
        }
    }

    /// Make a scene's metadata available for initialization.
    pub async fn register_scene(&self, scene: SceneInfo) {
        self.scenes.insert(scene).await;
    }
}

/// Facade over the story use cases, handed to transports and the CLI.
pub struct NarrativeEngine {
    story: StoryUseCases,
}

impl NarrativeEngine {
    pub fn new(story: StoryUseCases) -> Self {
        Self { story }
    }

    pub fn use_cases(&self) -> &StoryUseCases {
        &self.story
    }

    pub async fn get_story_data(&self, scene_id: SceneId) -> Result<StoryData, StoryError> {
        self.story.get_story.execute(scene_id).await
    }

    pub async fn initialize_story_for_scene(
        &self,
        scene_id: SceneId,
        prefs: &GenerationPreferences,
    ) -> Result<StoryRecord, StoryError> {
        self.story.initialize.execute(scene_id, prefs).await
    }

    pub async fn advance_story(
        &self,
        scene_id: SceneId,
        prefs: &GenerationPreferences,
    ) -> Result<StoryUpdate, StoryError> {
        self.story.advance.execute(scene_id, prefs).await
    }

    pub async fn make_choice(
        &self,
        scene_id: SceneId,
        node_id: NodeId,
        choice_id: ChoiceId,
        prefs: &GenerationPreferences,
    ) -> Result<ChoiceOutcome, StoryError> {
        self.story
            .choose
            .execute(scene_id, node_id, choice_id, prefs)
            .await
    }

    pub async fn rewind_to_node(
        &self,
        scene_id: SceneId,
        node_id: NodeId,
    ) -> Result<RewindOutcome, StoryError> {
        self.story.rewind.execute(scene_id, node_id).await
    }

    pub async fn complete_objective(
        &self,
        scene_id: SceneId,
        task_id: TaskId,
        objective_id: ObjectiveId,
    ) -> Result<Task, StoryError> {
        self.story
            .complete_objective
            .execute(scene_id, task_id, objective_id)
            .await
    }

    pub async fn complete_task(
        &self,
        scene_id: SceneId,
        task_id: TaskId,
    ) -> Result<Task, StoryError> {
        self.story.complete_task.execute(scene_id, task_id).await
    }

    pub async fn unlock_location(
        &self,
        scene_id: SceneId,
        location_id: LocationId,
    ) -> Result<Location, StoryError> {
        self.story.unlock_location.execute(scene_id, location_id).await
    }

    pub async fn explore_location(
        &self,
        scene_id: SceneId,
        location_id: LocationId,
        prefs: &GenerationPreferences,
    ) -> Result<ExplorationResult, StoryError> {
        self.story
            .explore_location
            .execute(scene_id, location_id, prefs)
            .await
    }

    pub async fn get_available_choices(
        &self,
        scene_id: SceneId,
    ) -> Result<Vec<Choice>, StoryError> {
        self.story.available_choices.execute(scene_id).await
    }

    /// Apply a caller-supplied mutation atomically.
    pub async fn execute_batch_operation<T, F>(
        &self,
        scene_id: SceneId,
        f: F,
    ) -> Result<T, StoryError>
    where
        F: FnOnce(&mut StoryRecord) -> Result<T, DomainError> + Send,
        T: Send,
    {
        self.story.batch.execute(scene_id, f).await
    }

    pub async fn execute_batch(
        &self,
        scene_id: SceneId,
        operations: Vec<BatchOperation>,
    ) -> Result<Vec<StoryRecordChange>, StoryError> {
        self.story.batch.execute_operations(scene_id, operations).await
    }

    pub async fn delete_story(&self, scene_id: SceneId) -> Result<(), StoryError> {
        self.story.delete.execute(scene_id).await
    }

    /// Branch view with a custom display truncation for `originalContent`.
    pub async fn branch_view(
        &self,
        scene_id: SceneId,
        options: BranchViewOptions,
    ) -> Result<BranchView, StoryError> {
        let data = self.get_story_data(scene_id).await?;
        Ok(build_branch_tree_with(data.record.nodes(), options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{LlmError, LlmRequest, LlmResponse};
    use async_trait::async_trait;

    /// Gateway that answers every prompt with a fixed beat.
    struct EchoLlm;

    #[async_trait]
    impl LlmPort for EchoLlm {
        async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse, LlmError> {
            Ok(LlmResponse::text(
                r#"{"intro": "Salt wind.", "mainObjective": "Reach the lighthouse",
                    "content": "Gulls wheel overhead.",
                    "choices": [{"text": "Follow the cliff"}, {"text": "Take the beach"}]}"#,
            ))
        }
    }

    fn app(dir: &std::path::Path) -> App {
        App::with_llm(
            EngineSettings::default().with_data_dir(dir),
            Arc::new(EchoLlm),
        )
    }

    #[tokio::test]
    async fn story_survives_a_new_process() {
        let dir = tempfile::tempdir().unwrap();
        let scene_id = SceneId::new();
        let prefs = GenerationPreferences::default();

        let first = app(dir.path());
        first
            .register_scene(SceneInfo::new(scene_id, "Cliffs", "Chalk cliffs over a grey sea."))
            .await;
        let record = first
            .engine
            .initialize_story_for_scene(scene_id, &prefs)
            .await
            .unwrap();
        let root = &record.nodes()[0];
        let chosen = first
            .engine
            .make_choice(scene_id, root.id, root.choices[0].id, &prefs)
            .await
            .unwrap();

        // A fresh app over the same directory sees the same story
        let second = app(dir.path());
        let data = second.engine.get_story_data(scene_id).await.unwrap();
        assert_eq!(data.view.anchor, Some(chosen.node.id));
        assert_eq!(data.view.current_path, vec![root.id, chosen.node.id]);

        let choices = second.engine.get_available_choices(scene_id).await.unwrap();
        assert_eq!(choices.len(), 2);
    }

    #[tokio::test]
    async fn branch_view_truncates_original_content() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let scene_id = SceneId::new();
        app.register_scene(SceneInfo::new(scene_id, "Cliffs", "Chalk cliffs over a grey sea."))
            .await;
        app.engine
            .initialize_story_for_scene(scene_id, &GenerationPreferences::default())
            .await
            .unwrap();

        let view = app
            .engine
            .branch_view(
                scene_id,
                BranchViewOptions {
                    original_content_limit: Some(5),
                },
            )
            .await
            .unwrap();
        assert_eq!(view.roots[0].original_content, "Chalk...");
    }

    #[tokio::test]
    async fn batch_closure_goes_through_the_facade() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let scene_id = SceneId::new();
        app.register_scene(SceneInfo::new(scene_id, "Cliffs", "Chalk cliffs."))
            .await;
        app.engine
            .initialize_story_for_scene(scene_id, &GenerationPreferences::default())
            .await
            .unwrap();

        let progress = app
            .engine
            .execute_batch_operation(scene_id, |record| {
                record.advance_progress(30);
                record.set_current_state("searching");
                Ok(record.progress())
            })
            .await
            .unwrap();

        assert_eq!(progress, 30);
        let data = app.engine.get_story_data(scene_id).await.unwrap();
        assert_eq!(data.record.current_state(), "searching");
    }
}
