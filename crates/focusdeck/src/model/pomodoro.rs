use super::{touch, EntityKind, Record, RecordId};
use crate::error::{FocusError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionType {
    Work,
    ShortBreak,
    LongBreak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSession {
    pub id: RecordId,
    pub user_id: String,
    pub session_type: SessionType,
    pub duration_minutes: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed: bool,
    pub interrupted: bool,
    pub task_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionDraft {
    pub user_id: String,
    pub session_type: SessionType,
    pub duration_minutes: u32,
    /// Defaults to the creation time.
    pub started_at: Option<DateTime<Utc>>,
    pub task_id: Option<String>,
    pub notes: Option<String>,
}

impl SessionDraft {
    pub fn new(user_id: impl Into<String>, session_type: SessionType, duration_minutes: u32) -> Self {
        Self {
            user_id: user_id.into(),
            session_type,
            duration_minutes,
            started_at: None,
            task_id: None,
            notes: None,
        }
    }

    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = Some(at);
        self
    }

    pub fn for_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub duration_minutes: Option<u32>,
    pub completed: Option<bool>,
    pub completed_at: Option<DateTime<Utc>>,
    pub interrupted: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SessionFilter {
    pub session_type: Option<SessionType>,
    pub completed: Option<bool>,
}

impl Record for PomodoroSession {
    const KIND: EntityKind = EntityKind::PomodoroSession;

    type Draft = SessionDraft;
    type Patch = SessionPatch;
    type Filter = SessionFilter;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.started_at
    }

    fn matches(&self, filter: &SessionFilter) -> bool {
        filter.session_type.map_or(true, |t| t == self.session_type)
            && filter.completed.map_or(true, |c| c == self.completed)
    }

    fn validate(draft: &SessionDraft) -> Result<()> {
        check_duration(draft.duration_minutes)
    }

    fn validate_patch(patch: &SessionPatch) -> Result<()> {
        patch.duration_minutes.map_or(Ok(()), check_duration)
    }

    fn from_draft(id: RecordId, draft: SessionDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: draft.user_id,
            session_type: draft.session_type,
            duration_minutes: draft.duration_minutes,
            started_at: draft.started_at.unwrap_or(now),
            completed_at: None,
            completed: false,
            interrupted: false,
            task_id: draft.task_id,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: SessionPatch, now: DateTime<Utc>) {
        if let Some(minutes) = patch.duration_minutes {
            self.duration_minutes = minutes;
        }
        if let Some(completed) = patch.completed {
            self.completed_at = match (completed, patch.completed_at) {
                (false, _) => None,
                (true, Some(at)) => Some(at),
                (true, None) if self.completed => self.completed_at.or(Some(now)),
                (true, None) => Some(now),
            };
            self.completed = completed;
        } else if let Some(at) = patch.completed_at {
            self.completed_at = Some(at);
        }
        if let Some(interrupted) = patch.interrupted {
            self.interrupted = interrupted;
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        self.updated_at = touch(self.created_at, now);
    }
}

fn check_duration(minutes: u32) -> Result<()> {
    if minutes == 0 {
        return Err(FocusError::Validation(
            "Session duration must be at least one minute".to_string(),
        ));
    }
    Ok(())
}

impl PomodoroSession {
    /// Neither finished nor abandoned.
    pub fn is_active(&self) -> bool {
        !self.completed && !self.interrupted
    }
}

/// Per-user timer configuration. Updated with [`SettingsPatch`] merges only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSettings {
    pub work_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub sessions_until_long_break: u32,
    pub auto_start_breaks: bool,
    pub auto_start_pomodoros: bool,
    pub sound_enabled: bool,
    pub daily_goal: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            sessions_until_long_break: 4,
            auto_start_breaks: false,
            auto_start_pomodoros: false,
            sound_enabled: true,
            daily_goal: 8,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub work_minutes: Option<u32>,
    pub short_break_minutes: Option<u32>,
    pub long_break_minutes: Option<u32>,
    pub sessions_until_long_break: Option<u32>,
    pub auto_start_breaks: Option<bool>,
    pub auto_start_pomodoros: Option<bool>,
    pub sound_enabled: Option<bool>,
    pub daily_goal: Option<u32>,
}

impl PomodoroSettings {
    pub fn merge(&mut self, patch: &SettingsPatch, now: DateTime<Utc>) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if let Some(value) = patch.$field { self.$field = value; })*
            };
        }
        take!(
            work_minutes,
            short_break_minutes,
            long_break_minutes,
            sessions_until_long_break,
            auto_start_breaks,
            auto_start_pomodoros,
            sound_enabled,
            daily_goal
        );
        self.updated_at = Some(now);
    }

    /// Length of the break that follows `completed_work_sessions` finished sessions.
    pub fn break_after(&self, completed_work_sessions: u32) -> (SessionType, u32) {
        let every = self.sessions_until_long_break.max(1);
        if completed_work_sessions > 0 && completed_work_sessions % every == 0 {
            (SessionType::LongBreak, self.long_break_minutes)
        } else {
            (SessionType::ShortBreak, self.short_break_minutes)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroStats {
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub interrupted_sessions: usize,
    pub total_focus_minutes: u64,
    pub today_sessions: usize,
    pub average_session_minutes: f64,
    pub completion_rate: f64,
    pub current_streak: u32,
}

impl PomodoroStats {
    pub(crate) fn refresh_rate(&mut self) {
        self.completion_rate = if self.total_sessions == 0 {
            0.0
        } else {
            self.completed_sessions as f64 / self.total_sessions as f64 * 100.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_merge_leaves_unspecified_fields() {
        let now = Utc::now();
        let mut settings = PomodoroSettings::default();
        settings.merge(
            &SettingsPatch {
                work_minutes: Some(50),
                ..Default::default()
            },
            now,
        );

        let expected = PomodoroSettings {
            work_minutes: 50,
            updated_at: Some(now),
            ..PomodoroSettings::default()
        };
        assert_eq!(settings, expected);
    }

    #[test]
    fn long_break_every_n_sessions() {
        let settings = PomodoroSettings::default();
        assert_eq!(settings.break_after(1), (SessionType::ShortBreak, 5));
        assert_eq!(settings.break_after(4), (SessionType::LongBreak, 15));
        assert_eq!(settings.break_after(0), (SessionType::ShortBreak, 5));
    }

    #[test]
    fn completing_stamps_completion_time() {
        let now = Utc::now();
        let mut session = PomodoroSession::from_draft(
            RecordId::generate(),
            SessionDraft::new("u1", SessionType::Work, 25),
            now,
        );
        assert!(session.is_active());

        let later = now + chrono::Duration::minutes(25);
        session.apply_patch(
            SessionPatch {
                completed: Some(true),
                ..Default::default()
            },
            later,
        );
        assert!(session.completed);
        assert_eq!(session.completed_at, Some(later));
        assert_eq!(session.updated_at, later);
        assert!(!session.is_active());
    }

    #[test]
    fn recompleting_keeps_completion_time() {
        let now = Utc::now();
        let mut session = PomodoroSession::from_draft(
            RecordId::generate(),
            SessionDraft::new("u1", SessionType::Work, 25),
            now,
        );
        let done = SessionPatch {
            completed: Some(true),
            ..Default::default()
        };
        let finished = now + chrono::Duration::minutes(25);
        session.apply_patch(done.clone(), finished);
        session.apply_patch(done, finished + chrono::Duration::hours(2));
        assert_eq!(session.completed_at, Some(finished));
    }

    #[test]
    fn zero_minute_sessions_are_invalid() {
        let draft = SessionDraft::new("u1", SessionType::Work, 0);
        assert!(PomodoroSession::validate(&draft).is_err());
        let shrink = SessionPatch {
            duration_minutes: Some(0),
            ..Default::default()
        };
        assert!(PomodoroSession::validate_patch(&shrink).is_err());
    }
}
