use super::{CreateRecord, DeleteRecord, FocusClient, MutationResult, UpdateRecord};
use crate::cache::{CacheData, Query, QueryKey};
use crate::model::{
    RecordId, TimeEntry, TimeEntryDraft, TimeEntryPatch, TimeProject, TimeProjectDraft,
    TimeProjectPatch,
};
use crate::store::DataStore;

/// Outcome of [`FocusClient::toggle_timer`].
#[derive(Debug, Clone, PartialEq)]
pub enum TimerToggle {
    Started(MutationResult<TimeEntry>),
    Stopped(MutationResult<Option<TimeEntry>>),
}

impl<S: DataStore> FocusClient<S> {
    /// Start a running timer. A timer that is already running is stopped first.
    pub fn start_timer(&mut self, draft: TimeEntryDraft) -> MutationResult<TimeEntry> {
        if let Some(running) = self.active_timer(&draft.user_id) {
            if !self.set_timer_running(&draft.user_id, running.id, false).is_committed() {
                return MutationResult::RolledBack;
            }
        }
        self.mutate(CreateRecord::<TimeEntry>::new(draft).labelled("start timer"))
    }

    /// Put a timer in the given state. Sending the state rather than a flip
    /// keeps repeated clicks harmless.
    pub fn set_timer_running(
        &mut self,
        user_id: &str,
        id: RecordId,
        running: bool,
    ) -> MutationResult<Option<TimeEntry>> {
        let (patch, label) = if running {
            let patch = TimeEntryPatch {
                is_running: Some(true),
                ..Default::default()
            };
            (patch, "resume timer")
        } else {
            (TimeEntryPatch::stop(), "stop timer")
        };
        self.mutate(UpdateRecord::<TimeEntry>::new(user_id, id, patch).labelled(label))
    }

    /// Stop the running timer, or start one described by `description`.
    pub fn toggle_timer(&mut self, user_id: &str, description: &str) -> TimerToggle {
        match self.active_timer(user_id) {
            Some(entry) => TimerToggle::Stopped(self.set_timer_running(user_id, entry.id, false)),
            None => TimerToggle::Started(self.start_timer(TimeEntryDraft::running(user_id, description))),
        }
    }

    pub fn active_timer(&mut self, user_id: &str) -> Option<TimeEntry> {
        match self.query(&QueryKey::new(user_id, Query::ActiveTimer)).data {
            Some(CacheData::ActiveTimer(entry)) => entry,
            _ => None,
        }
    }

    /// Log a finished block of time.
    pub fn create_entry(&mut self, draft: TimeEntryDraft) -> MutationResult<TimeEntry> {
        self.mutate(CreateRecord::<TimeEntry>::new(draft))
    }

    pub fn update_entry(
        &mut self,
        user_id: &str,
        id: RecordId,
        patch: TimeEntryPatch,
    ) -> MutationResult<Option<TimeEntry>> {
        self.mutate(UpdateRecord::<TimeEntry>::new(user_id, id, patch))
    }

    pub fn delete_entry(&mut self, user_id: &str, id: RecordId) -> MutationResult<bool> {
        self.mutate(DeleteRecord::<TimeEntry>::new(user_id, id))
    }

    pub fn create_time_project(&mut self, draft: TimeProjectDraft) -> MutationResult<TimeProject> {
        self.mutate(CreateRecord::<TimeProject>::new(draft))
    }

    pub fn update_time_project(
        &mut self,
        user_id: &str,
        id: RecordId,
        patch: TimeProjectPatch,
    ) -> MutationResult<Option<TimeProject>> {
        self.mutate(UpdateRecord::<TimeProject>::new(user_id, id, patch))
    }

    pub fn delete_time_project(&mut self, user_id: &str, id: RecordId) -> MutationResult<bool> {
        self.mutate(DeleteRecord::<TimeProject>::new(user_id, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fixtures::ClientFixture;
    use crate::model::{ListParams, TimeEntryFilter};
    use chrono::Duration;

    #[test]
    fn toggle_starts_then_stops() {
        let mut fx = ClientFixture::new();
        let TimerToggle::Started(started) = fx.client.toggle_timer("u1", "Deep work") else {
            panic!("expected a start");
        };
        let entry = started.committed().unwrap();
        assert!(entry.is_running);

        fx.clock.advance(Duration::minutes(40));
        let TimerToggle::Stopped(stopped) = fx.client.toggle_timer("u1", "Deep work") else {
            panic!("expected a stop");
        };
        let entry = stopped.committed().flatten().unwrap();
        assert_eq!(entry.duration_minutes(), Some(40));
        assert_eq!(fx.client.active_timer("u1"), None);
    }

    #[test]
    fn stopping_twice_is_harmless() {
        let mut fx = ClientFixture::new();
        let entry = fx
            .client
            .start_timer(TimeEntryDraft::running("u1", "Email"))
            .committed()
            .unwrap();
        fx.clock.advance(Duration::minutes(5));
        fx.client.set_timer_running("u1", entry.id.clone(), false);
        fx.clock.advance(Duration::minutes(5));
        let again = fx
            .client
            .set_timer_running("u1", entry.id, false)
            .committed()
            .flatten()
            .unwrap();
        assert_eq!(again.duration_minutes(), Some(5));
    }

    #[test]
    fn starting_a_timer_stops_the_running_one() {
        let mut fx = ClientFixture::new();
        let first = fx
            .client
            .start_timer(TimeEntryDraft::running("u1", "Email"))
            .committed()
            .unwrap();
        fx.clock.advance(Duration::minutes(1));
        let second = fx
            .client
            .start_timer(TimeEntryDraft::running("u1", "Report"))
            .committed()
            .unwrap();

        let running = TimeEntryFilter {
            running: Some(true),
            ..Default::default()
        };
        let page = fx
            .client
            .api()
            .list::<TimeEntry>("u1", &ListParams::new(running, 10))
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, second.id);
        assert_ne!(first.id, second.id);
    }
}
