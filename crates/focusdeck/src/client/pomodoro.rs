use super::{CreateRecord, DeleteRecord, FocusClient, MutationResult, UpdateRecord, UpdateSettings};
use crate::cache::{CacheData, Query, QueryKey};
use crate::error::Result;
use crate::model::{
    PomodoroSession, PomodoroSettings, RecordId, SessionDraft, SessionPatch, SessionType,
    SettingsPatch,
};
use crate::services::Services;
use crate::store::DataStore;

pub const SESSION_XP: u32 = 25;

fn session_finished(session: &PomodoroSession, services: &Services) -> Result<()> {
    if session.completed && session.session_type == SessionType::Work {
        services.sounds.play_notification();
        services.gamification.award_xp(SESSION_XP, "Completed a focus session")?;
    }
    Ok(())
}

impl<S: DataStore> FocusClient<S> {
    pub fn start_session(&mut self, draft: SessionDraft) -> MutationResult<PomodoroSession> {
        self.mutate(CreateRecord::<PomodoroSession>::new(draft).labelled("start session"))
    }

    /// Start the break that follows today's finished work sessions, sized by
    /// the user's settings.
    pub fn start_break(&mut self, user_id: &str) -> MutationResult<PomodoroSession> {
        let settings = self.current_settings(user_id);
        let finished_today = match self.query(&QueryKey::new(user_id, Query::PomodoroStats)).data {
            Some(CacheData::PomodoroStats(stats)) => u32::try_from(stats.today_sessions).unwrap_or(u32::MAX),
            _ => 0,
        };
        let (session_type, minutes) = settings.break_after(finished_today);
        self.start_session(SessionDraft::new(user_id, session_type, minutes))
    }

    pub fn complete_session(&mut self, user_id: &str, id: RecordId) -> MutationResult<Option<PomodoroSession>> {
        let patch = SessionPatch {
            completed: Some(true),
            completed_at: Some(self.now()),
            ..Default::default()
        };
        self.mutate(
            UpdateRecord::<PomodoroSession>::new(user_id, id, patch)
                .labelled("complete session")
                .on_success(session_finished),
        )
    }

    pub fn interrupt_session(&mut self, user_id: &str, id: RecordId) -> MutationResult<Option<PomodoroSession>> {
        let patch = SessionPatch {
            interrupted: Some(true),
            ..Default::default()
        };
        self.mutate(UpdateRecord::<PomodoroSession>::new(user_id, id, patch).labelled("stop session"))
    }

    pub fn delete_session(&mut self, user_id: &str, id: RecordId) -> MutationResult<bool> {
        self.mutate(DeleteRecord::<PomodoroSession>::new(user_id, id))
    }

    pub fn update_settings(&mut self, user_id: &str, patch: SettingsPatch) -> MutationResult<PomodoroSettings> {
        self.mutate(UpdateSettings::new(user_id, patch))
    }

    /// Settings through the cache, falling back to defaults when unreadable.
    pub fn current_settings(&mut self, user_id: &str) -> PomodoroSettings {
        match self.query(&QueryKey::new(user_id, Query::PomodoroSettings)).data {
            Some(CacheData::Settings(settings)) => settings,
            _ => PomodoroSettings::default(),
        }
    }

    pub fn active_session(&mut self, user_id: &str) -> Option<PomodoroSession> {
        match self.query(&QueryKey::new(user_id, Query::ActiveSession)).data {
            Some(CacheData::ActiveSession(session)) => session,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fixtures::ClientFixture;
    use crate::services::ServiceCall;

    #[test]
    fn finishing_work_plays_a_sound_and_awards_xp() {
        let mut fx = ClientFixture::new();
        let session = fx
            .client
            .start_session(SessionDraft::new("u1", SessionType::Work, 25))
            .committed()
            .unwrap();
        assert_eq!(fx.client.active_session("u1").map(|s| s.id), Some(session.id.clone()));

        fx.client.complete_session("u1", session.id);
        assert_eq!(fx.client.active_session("u1"), None);
        assert!(fx.log.calls().contains(&ServiceCall::Notification));
        assert_eq!(fx.log.total_xp(), SESSION_XP);
    }

    #[test]
    fn breaks_earn_nothing() {
        let mut fx = ClientFixture::new();
        let session = fx
            .client
            .start_session(SessionDraft::new("u1", SessionType::ShortBreak, 5))
            .committed()
            .unwrap();
        fx.client.complete_session("u1", session.id);
        assert_eq!(fx.log.total_xp(), 0);
    }

    #[test]
    fn optimistic_session_is_active_before_the_store_answers() {
        let mut fx = ClientFixture::new();
        let key = QueryKey::new("u1", Query::ActiveSession);
        fx.client.query(&key);

        let pending = fx
            .client
            .begin(CreateRecord::<PomodoroSession>::new(SessionDraft::new("u1", SessionType::Work, 25)));
        let Some(CacheData::ActiveSession(Some(active))) = fx.client.peek(&key).data else {
            panic!("no optimistic session");
        };
        assert!(active.id.is_temp());

        let stored = fx.client.settle(pending).committed().unwrap();
        let Some(CacheData::ActiveSession(Some(active))) = fx.client.peek(&key).data else {
            panic!("session lost");
        };
        assert_eq!(active.id, stored.id);
    }

    #[test]
    fn fourth_session_earns_a_long_break() {
        let mut fx = ClientFixture::new();
        for _ in 0..4 {
            let session = fx
                .client
                .start_session(SessionDraft::new("u1", SessionType::Work, 25))
                .committed()
                .unwrap();
            fx.client.complete_session("u1", session.id);
        }
        let pause = fx.client.start_break("u1").committed().unwrap();
        assert_eq!(pause.session_type, SessionType::LongBreak);
        assert_eq!(pause.duration_minutes, 15);
    }

    #[test]
    fn settings_update_merges() {
        let mut fx = ClientFixture::new();
        let before = fx.client.current_settings("u1");
        let patch = SettingsPatch {
            daily_goal: Some(10),
            ..Default::default()
        };
        let after = fx.client.update_settings("u1", patch).committed().unwrap();
        assert_eq!(after.daily_goal, 10);
        assert_eq!(after.work_minutes, before.work_minutes);
        assert_eq!(fx.client.current_settings("u1").daily_goal, 10);
    }
}
