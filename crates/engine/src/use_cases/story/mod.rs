//! Story use cases - the mutation engine over per-scene story records.
//!
//! Every mutation runs under the scene's lock (see [`records::StoryRecords`]);
//! different scenes proceed in parallel. Generation calls happen inside the
//! lock, so a failed or timed-out generation never leaves a partial write.

mod advance;
mod batch;
mod choose;
mod error;
pub mod generation;
mod initialize;
mod locations;
mod objectives;
mod query;
mod records;
mod rewind;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

pub use advance::{AdvanceStory, StoryUpdate, STATE_COMPLETED, STATE_IN_PROGRESS};
pub use batch::ExecuteBatch;
pub use choose::{ChoiceOutcome, MakeChoice};
pub use error::{StoryError, FALLBACK_NARRATION};
pub use generation::StoryGenerator;
pub use initialize::InitializeStory;
pub use locations::{ExplorationResult, ExploreLocation, UnlockLocation};
pub use objectives::{CompleteObjective, CompleteTask};
pub use query::{DeleteStory, GetAvailableChoices, GetStoryData, StoryData};
pub use records::StoryRecords;
pub use rewind::{RewindOutcome, RewindToNode};

use crate::infrastructure::ports::{
    ClockPort, ConversationLog, LlmPort, RandomPort, SceneCatalog, StoryRecordRepo,
};
use crate::infrastructure::settings::EngineSettings;
use crate::stores::SceneLocks;

/// Adapters the story use cases run against.
pub struct StoryPorts {
    pub repo: Arc<dyn StoryRecordRepo>,
    pub scenes: Arc<dyn SceneCatalog>,
    pub conversation: Arc<dyn ConversationLog>,
    pub llm: Arc<dyn LlmPort>,
    pub clock: Arc<dyn ClockPort>,
    pub random: Arc<dyn RandomPort>,
    pub locks: Arc<SceneLocks>,
}

/// Container for story use cases.
pub struct StoryUseCases {
    pub initialize: Arc<InitializeStory>,
    pub advance: Arc<AdvanceStory>,
    pub choose: Arc<MakeChoice>,
    pub rewind: Arc<RewindToNode>,
    pub complete_objective: Arc<CompleteObjective>,
    pub complete_task: Arc<CompleteTask>,
    pub unlock_location: Arc<UnlockLocation>,
    pub explore_location: Arc<ExploreLocation>,
    pub batch: Arc<ExecuteBatch>,
    pub get_story: Arc<GetStoryData>,
    pub available_choices: Arc<GetAvailableChoices>,
    pub delete: Arc<DeleteStory>,
}

impl StoryUseCases {
    pub fn new(ports: StoryPorts, settings: &EngineSettings) -> Self {
        let StoryPorts {
            repo,
            scenes,
            conversation,
            llm,
            clock,
            random,
            locks,
        } = ports;

        let records = Arc::new(StoryRecords::new(repo, locks, conversation));
        let generator = Arc::new(StoryGenerator::new(llm, settings.generation_timeout()));
        let window = settings.recent_narration_window;

        let initialize = Arc::new(InitializeStory::new(
            records.clone(),
            scenes,
            generator.clone(),
            clock.clone(),
        ));

        Self {
            advance: Arc::new(AdvanceStory::new(
                records.clone(),
                initialize.clone(),
                generator.clone(),
                clock.clone(),
                random,
                settings.progress_policy,
                window,
            )),
            initialize,
            choose: Arc::new(MakeChoice::new(
                records.clone(),
                generator.clone(),
                clock.clone(),
                window,
            )),
            rewind: Arc::new(RewindToNode::new(records.clone(), clock.clone())),
            complete_objective: Arc::new(CompleteObjective::new(
                records.clone(),
                clock.clone(),
                settings.task_completion,
            )),
            complete_task: Arc::new(CompleteTask::new(records.clone(), clock.clone())),
            unlock_location: Arc::new(UnlockLocation::new(records.clone(), clock.clone())),
            explore_location: Arc::new(ExploreLocation::new(
                records.clone(),
                generator,
                clock.clone(),
                window,
            )),
            batch: Arc::new(ExecuteBatch::new(
                records.clone(),
                clock,
                settings.task_completion,
            )),
            get_story: Arc::new(GetStoryData::new(records.clone())),
            available_choices: Arc::new(GetAvailableChoices::new(records.clone())),
            delete: Arc::new(DeleteStory::new(records)),
        }
    }
}
