use super::{CreateRecord, DeleteRecord, FocusClient, MutationResult, PendingMutation, UpdateRecord};
use crate::cache::optimistic::find_record;
use crate::cache::{CacheData, Query, QueryKey};
use crate::error::Result;
use crate::model::{
    GtdCategory, GtdItem, GtdItemDraft, GtdItemPatch, GtdProject, GtdProjectDraft,
    GtdProjectPatch, RecordId,
};
use crate::services::{MessageLevel, Services};
use crate::store::DataStore;

pub const ITEM_XP: u32 = 5;

fn schedule_reminder(item: &GtdItem, services: &Services) -> Result<()> {
    match item.remind_at {
        Some(at) => services.reminders.schedule(item, at),
        None => Ok(()),
    }
}

fn item_done(item: &GtdItem, services: &Services) -> Result<()> {
    if item.completed {
        services.sounds.play_click();
        services.gamification.award_xp(ITEM_XP, "Completed an item")?;
    }
    Ok(())
}

impl<S: DataStore> FocusClient<S> {
    /// New item, in the inbox unless the draft says otherwise. Items with a
    /// reminder time get a reminder scheduled.
    pub fn capture(&mut self, draft: GtdItemDraft) -> MutationResult<GtdItem> {
        self.mutate(
            CreateRecord::<GtdItem>::new(draft)
                .labelled("capture item")
                .on_success(schedule_reminder),
        )
    }

    pub fn update_item(
        &mut self,
        user_id: &str,
        id: RecordId,
        patch: GtdItemPatch,
    ) -> MutationResult<Option<GtdItem>> {
        let reschedule = patch.remind_at.is_some();
        let mut mutation = UpdateRecord::<GtdItem>::new(user_id, id, patch);
        if reschedule {
            mutation = mutation.on_success(schedule_reminder);
        }
        self.mutate(mutation)
    }

    pub fn complete_item(&mut self, user_id: &str, id: RecordId) -> MutationResult<Option<GtdItem>> {
        let patch = GtdItemPatch {
            completed: Some(true),
            ..Default::default()
        };
        self.mutate(
            UpdateRecord::<GtdItem>::new(user_id, id, patch)
                .labelled("complete item")
                .on_success(item_done),
        )
    }

    /// Process an item into another category.
    pub fn move_item(
        &mut self,
        user_id: &str,
        id: RecordId,
        category: GtdCategory,
    ) -> MutationResult<Option<GtdItem>> {
        let patch = GtdItemPatch {
            category: Some(category),
            ..Default::default()
        };
        self.mutate(UpdateRecord::<GtdItem>::new(user_id, id, patch).labelled("move item"))
    }

    pub fn set_subtask(
        &mut self,
        user_id: &str,
        id: RecordId,
        subtask_id: &str,
        completed: bool,
    ) -> MutationResult<Option<GtdItem>> {
        self.mutate(subtask_mutation(user_id, id, subtask_id, completed))
    }

    /// Start flipping a subtask. The desired state is read from the cache as
    /// it stands now, optimistic writes included, and sent as a value. An item
    /// no list holds is loaded into its detail entry first, so the optimistic
    /// flip has somewhere to land. Returns `None` when the subtask is unknown
    /// or the item could not be read.
    pub fn begin_toggle_subtask(
        &mut self,
        user_id: &str,
        id: RecordId,
        subtask_id: &str,
    ) -> Option<PendingMutation<UpdateRecord<GtdItem>>> {
        let item: GtdItem = match find_record::<GtdItem>(self.cache(), user_id, &id) {
            Some(item) => item,
            None => self.load_item(user_id, &id)?,
        };
        let completed = !item.subtask(subtask_id)?.completed;
        Some(self.begin(subtask_mutation(user_id, id, subtask_id, completed)))
    }

    fn load_item(&mut self, user_id: &str, id: &RecordId) -> Option<GtdItem> {
        let detail = self.query(&QueryKey::new(user_id, Query::GtdItem { id: id.clone() }));
        if let Some(error) = detail.error {
            tracing::warn!(item = %id, error = %error, "could not load item");
            self.services()
                .notifier
                .notify(MessageLevel::Error, "Failed to update subtask");
            return None;
        }
        match detail.data {
            Some(CacheData::GtdItem(item)) => item,
            _ => None,
        }
    }

    pub fn toggle_subtask(
        &mut self,
        user_id: &str,
        id: RecordId,
        subtask_id: &str,
    ) -> Option<MutationResult<Option<GtdItem>>> {
        let pending = self.begin_toggle_subtask(user_id, id, subtask_id)?;
        Some(self.settle(pending))
    }

    pub fn delete_item(&mut self, user_id: &str, id: RecordId) -> MutationResult<bool> {
        self.mutate(DeleteRecord::<GtdItem>::new(user_id, id))
    }

    pub fn create_gtd_project(&mut self, draft: GtdProjectDraft) -> MutationResult<GtdProject> {
        self.mutate(CreateRecord::<GtdProject>::new(draft))
    }

    pub fn update_gtd_project(
        &mut self,
        user_id: &str,
        id: RecordId,
        patch: GtdProjectPatch,
    ) -> MutationResult<Option<GtdProject>> {
        self.mutate(UpdateRecord::<GtdProject>::new(user_id, id, patch))
    }

    pub fn delete_gtd_project(&mut self, user_id: &str, id: RecordId) -> MutationResult<bool> {
        self.mutate(DeleteRecord::<GtdProject>::new(user_id, id))
    }
}

fn subtask_mutation(user_id: &str, id: RecordId, subtask_id: &str, completed: bool) -> UpdateRecord<GtdItem> {
    let patch = GtdItemPatch {
        subtask_states: vec![(subtask_id.to_string(), completed)],
        ..Default::default()
    };
    UpdateRecord::new(user_id, id, patch).labelled("update subtask")
}
