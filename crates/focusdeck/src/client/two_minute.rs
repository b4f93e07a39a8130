use super::{CreateRecord, DeleteRecord, FocusClient, MutationResult, UpdateRecord};
use crate::error::Result;
use crate::model::{RecordId, TwoMinuteTask, TwoMinuteTaskDraft, TwoMinuteTaskPatch};
use crate::services::Services;
use crate::store::DataStore;

pub const TASK_XP: u32 = 10;

fn task_done(task: &TwoMinuteTask, services: &Services) -> Result<()> {
    if task.completed {
        services.sounds.play_click();
        services.gamification.award_xp(TASK_XP, "Completed a two-minute task")?;
    }
    Ok(())
}

impl<S: DataStore> FocusClient<S> {
    pub fn create_task(&mut self, draft: TwoMinuteTaskDraft) -> MutationResult<TwoMinuteTask> {
        self.mutate(CreateRecord::<TwoMinuteTask>::new(draft))
    }

    pub fn complete_task(
        &mut self,
        user_id: &str,
        id: RecordId,
        actual_duration_seconds: Option<u32>,
    ) -> MutationResult<Option<TwoMinuteTask>> {
        self.mutate(
            UpdateRecord::<TwoMinuteTask>::new(
                user_id,
                id,
                TwoMinuteTaskPatch::complete(actual_duration_seconds),
            )
            .labelled("complete task")
            .on_success(task_done),
        )
    }

    /// Put a completed task back in the queue.
    pub fn reopen_task(&mut self, user_id: &str, id: RecordId) -> MutationResult<Option<TwoMinuteTask>> {
        let patch = TwoMinuteTaskPatch {
            completed: Some(false),
            ..Default::default()
        };
        self.mutate(UpdateRecord::<TwoMinuteTask>::new(user_id, id, patch).labelled("reopen task"))
    }

    pub fn delete_task(&mut self, user_id: &str, id: RecordId) -> MutationResult<bool> {
        self.mutate(DeleteRecord::<TwoMinuteTask>::new(user_id, id))
    }
}
