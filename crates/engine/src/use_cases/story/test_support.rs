//! Shared fixtures for story use case tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use branchtale_domain::{
    Choice, ContentSource, Location, NodeType, SceneId, SceneInfo, StoryNode, StoryRecord, Task,
};
use chrono::{TimeZone, Utc};

use super::{StoryPorts, StoryUseCases};
use crate::infrastructure::clock::{FixedRandom, TickingClock};
use crate::infrastructure::persistence::{
    InMemoryConversationLog, InMemorySceneCatalog, InMemoryStoryStore,
};
use crate::infrastructure::ports::{
    ClockPort, LlmError, LlmPort, LlmRequest, LlmResponse, RandomPort, StoryRecordRepo,
};
use crate::infrastructure::settings::EngineSettings;
use crate::stores::SceneLocks;

pub const DEFAULT_BEAT: &str = r#"{"title": "Onward", "content": "The path winds on.", "choices": [{"text": "Keep walking"}]}"#;

/// LLM double that replays scripted replies, then repeats a default beat.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    pub fn fail(self, error: LlmError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmPort for ScriptedLlm {
    async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(DEFAULT_BEAT.to_string()))
            .map(LlmResponse::text)
    }
}

/// Story use cases over in-memory adapters.
pub struct Harness {
    pub store: InMemoryStoryStore,
    pub scenes: InMemorySceneCatalog,
    pub conversation: InMemoryConversationLog,
    pub llm: Arc<ScriptedLlm>,
    pub story: StoryUseCases,
}

impl Harness {
    pub fn new(llm: ScriptedLlm) -> Self {
        Self::with_settings(llm, EngineSettings::default())
    }

    pub fn with_settings(llm: ScriptedLlm, settings: EngineSettings) -> Self {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        Self::with_ports(
            llm,
            settings,
            Arc::new(TickingClock::new(start)),
            Arc::new(FixedRandom(7)),
        )
    }

    /// Harness with caller-supplied time and dice.
    pub fn with_ports(
        llm: ScriptedLlm,
        settings: EngineSettings,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        let store = InMemoryStoryStore::new();
        let scenes = InMemorySceneCatalog::new();
        let conversation = InMemoryConversationLog::new();
        let llm = Arc::new(llm);

        let story = StoryUseCases::new(
            StoryPorts {
                repo: Arc::new(store.clone()),
                scenes: Arc::new(scenes.clone()),
                conversation: Arc::new(conversation.clone()),
                llm: llm.clone(),
                clock,
                random,
                locks: Arc::new(SceneLocks::new()),
            },
            &settings,
        );

        Self {
            store,
            scenes,
            conversation,
            llm,
            story,
        }
    }

    /// Register a scene in the catalog.
    pub async fn scene(&self) -> SceneId {
        let id = SceneId::new();
        self.scenes
            .insert(SceneInfo::new(
                id,
                "The Drowned Abbey",
                "A flooded abbey on a storm-battered coast.",
            ))
            .await;
        id
    }

    /// Persist a small record directly: root with two choices, one task with
    /// two objectives, one locked and one open location.
    pub async fn seeded(&self) -> StoryRecord {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();
        let root = StoryNode::new(
            None,
            NodeType::Narrative,
            "Waves crash against the abbey walls.",
            ContentSource::Authored,
            now,
        )
        .with_original_content("A flooded abbey on a storm-battered coast.")
        .with_choices(vec![
            Choice::new("Enter the nave").with_order(0),
            Choice::new("Circle the cloister").with_order(1),
        ]);
        let record = StoryRecord::new(SceneId::new(), "intro", "Find the abbot", root, now)
            .with_task(
                Task::new("Light the beacon", ContentSource::Authored)
                    .with_objective("Find oil")
                    .with_objective("Climb the tower"),
            )
            .with_location(Location::new("Crypt", ContentSource::Authored))
            .with_location(Location::new("Bell tower", ContentSource::Authored).accessible());
        self.store.save(&record).await.unwrap();
        record
    }

    pub async fn stored(&self, scene_id: SceneId) -> StoryRecord {
        self.store.load(scene_id).await.unwrap().unwrap()
    }
}
