//! Task and objective completion.

use std::sync::Arc;

use branchtale_domain::{
    ObjectiveId, SceneId, StoryRecordChange, Task, TaskCompletionPolicy, TaskId,
};

use super::records::StoryRecords;
use super::StoryError;
use crate::infrastructure::ports::ClockPort;

/// Flip one objective to completed.
///
/// Whether the parent task follows is decided by the configured
/// [`TaskCompletionPolicy`]; the default never completes it.
pub struct CompleteObjective {
    records: Arc<StoryRecords>,
    clock: Arc<dyn ClockPort>,
    policy: TaskCompletionPolicy,
}

impl CompleteObjective {
    pub fn new(
        records: Arc<StoryRecords>,
        clock: Arc<dyn ClockPort>,
        policy: TaskCompletionPolicy,
    ) -> Self {
        Self {
            records,
            clock,
            policy,
        }
    }

    /// Returns the task as stored after the change.
    pub async fn execute(
        &self,
        scene_id: SceneId,
        task_id: TaskId,
        objective_id: ObjectiveId,
    ) -> Result<Task, StoryError> {
        let policy = self.policy;
        let (task, change) = self
            .records
            .mutate(scene_id, self.clock.now(), move |record| {
                let change = record.complete_objective(task_id, objective_id, policy)?;
                Ok((record.task(task_id).cloned(), change))
            })
            .await?;

        let task_completed = matches!(
            change,
            StoryRecordChange::ObjectiveCompleted {
                task_completed: true,
                ..
            }
        );
        tracing::info!(
            scene_id = %scene_id,
            task_id = %task_id,
            objective_id = %objective_id,
            task_completed,
            "Objective completed"
        );
        task.ok_or_else(|| StoryError::not_found("Task", task_id))
    }
}

pub struct CompleteTask {
    records: Arc<StoryRecords>,
    clock: Arc<dyn ClockPort>,
}

impl CompleteTask {
    pub fn new(records: Arc<StoryRecords>, clock: Arc<dyn ClockPort>) -> Self {
        Self { records, clock }
    }

    pub async fn execute(&self, scene_id: SceneId, task_id: TaskId) -> Result<Task, StoryError> {
        let task = self
            .records
            .mutate(scene_id, self.clock.now(), move |record| {
                record.complete_task(task_id)?;
                Ok(record.task(task_id).cloned())
            })
            .await?;
        tracing::info!(scene_id = %scene_id, task_id = %task_id, "Task completed");
        task.ok_or_else(|| StoryError::not_found("Task", task_id))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{Harness, ScriptedLlm};
    use super::*;
    use crate::infrastructure::settings::EngineSettings;

    #[tokio::test]
    async fn objective_does_not_complete_task_by_default() {
        let harness = Harness::new(ScriptedLlm::new());
        let seeded = harness.seeded().await;
        let task = &seeded.tasks()[0];

        for objective in &task.objectives {
            harness
                .story
                .complete_objective
                .execute(seeded.scene_id(), task.id, objective.id)
                .await
                .unwrap();
        }

        let stored = harness.stored(seeded.scene_id()).await;
        let stored_task = stored.task(task.id).unwrap();
        assert!(stored_task.objectives.iter().all(|o| o.completed));
        assert!(!stored_task.completed);
    }

    #[tokio::test]
    async fn all_objectives_policy_completes_task() {
        let settings = EngineSettings {
            task_completion: TaskCompletionPolicy::AllObjectives,
            ..EngineSettings::default()
        };
        let harness = Harness::with_settings(ScriptedLlm::new(), settings);
        let seeded = harness.seeded().await;
        let task = &seeded.tasks()[0];

        let first = harness
            .story
            .complete_objective
            .execute(seeded.scene_id(), task.id, task.objectives[0].id)
            .await
            .unwrap();
        assert!(!first.completed);

        let last = harness
            .story
            .complete_objective
            .execute(seeded.scene_id(), task.id, task.objectives[1].id)
            .await
            .unwrap();
        assert!(last.completed);
    }

    #[tokio::test]
    async fn unknown_objective_is_not_found() {
        let harness = Harness::new(ScriptedLlm::new());
        let seeded = harness.seeded().await;

        let err = harness
            .story
            .complete_objective
            .execute(seeded.scene_id(), seeded.tasks()[0].id, ObjectiveId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoryError::NotFound { entity: "Objective", .. }));
    }

    #[tokio::test]
    async fn completing_task_twice_is_conflict() {
        let harness = Harness::new(ScriptedLlm::new());
        let seeded = harness.seeded().await;
        let task_id = seeded.tasks()[0].id;

        let task = harness
            .story
            .complete_task
            .execute(seeded.scene_id(), task_id)
            .await
            .unwrap();
        assert!(task.completed);

        let err = harness
            .story
            .complete_task
            .execute(seeded.scene_id(), task_id)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }
}
