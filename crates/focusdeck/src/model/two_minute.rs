use super::{require_text, touch, EntityKind, Record, RecordId};
use crate::error::{FocusError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest estimate, in minutes, a task may carry and still qualify for the rule.
pub const TWO_MINUTE_LIMIT: u32 = 2;

pub const DEFAULT_CATEGORY: &str = "general";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoMinuteTask {
    pub id: RecordId,
    pub user_id: String,
    pub title: String,
    /// Minutes.
    pub estimated_duration: u32,
    pub category: String,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub actual_duration_seconds: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TwoMinuteTaskDraft {
    pub user_id: String,
    pub title: String,
    pub estimated_duration: u32,
    pub category: Option<String>,
}

impl TwoMinuteTaskDraft {
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, estimated_duration: u32) -> Self {
        Self {
            user_id: user_id.into(),
            title: title.into(),
            estimated_duration,
            category: None,
        }
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct TwoMinuteTaskPatch {
    pub title: Option<String>,
    pub estimated_duration: Option<u32>,
    pub category: Option<String>,
    pub completed: Option<bool>,
    pub actual_duration_seconds: Option<u32>,
}

impl TwoMinuteTaskPatch {
    pub fn complete(actual_duration_seconds: Option<u32>) -> Self {
        Self {
            completed: Some(true),
            actual_duration_seconds,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TaskStatusFilter {
    #[default]
    Active,
    Completed,
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TwoMinuteFilter {
    pub status: TaskStatusFilter,
    pub category: Option<String>,
}

impl TwoMinuteFilter {
    pub fn with_status(status: TaskStatusFilter) -> Self {
        Self {
            status,
            category: None,
        }
    }
}

impl Record for TwoMinuteTask {
    const KIND: EntityKind = EntityKind::TwoMinuteTask;

    type Draft = TwoMinuteTaskDraft;
    type Patch = TwoMinuteTaskPatch;
    type Filter = TwoMinuteFilter;

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
        self.created_at
    }

    fn matches(&self, filter: &TwoMinuteFilter) -> bool {
        let status_ok = match filter.status {
            TaskStatusFilter::Active => !self.completed,
            TaskStatusFilter::Completed => self.completed,
            TaskStatusFilter::All => true,
        };
        status_ok
            && filter
                .category
                .as_deref()
                .map_or(true, |c| c == self.category)
    }

    fn validate(draft: &TwoMinuteTaskDraft) -> Result<()> {
        require_text("Title", &draft.title)?;
        check_estimate(draft.estimated_duration)
    }

    fn validate_patch(patch: &TwoMinuteTaskPatch) -> Result<()> {
        if let Some(title) = &patch.title {
            require_text("Title", title)?;
        }
        patch.estimated_duration.map_or(Ok(()), check_estimate)
    }

    fn from_draft(id: RecordId, draft: TwoMinuteTaskDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: draft.user_id,
            title: draft.title.trim().to_string(),
            estimated_duration: draft.estimated_duration,
            category: draft
                .category
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            completed: false,
            completed_at: None,
            actual_duration_seconds: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: TwoMinuteTaskPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(estimate) = patch.estimated_duration {
            self.estimated_duration = estimate;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(completed) = patch.completed {
            if !completed {
                self.completed_at = None;
            } else if !self.completed {
                self.completed_at = Some(now);
            }
            self.completed = completed;
        }
        if let Some(seconds) = patch.actual_duration_seconds {
            self.actual_duration_seconds = Some(seconds);
        }
        self.updated_at = touch(self.created_at, now);
    }
}

fn check_estimate(minutes: u32) -> Result<()> {
    if minutes == 0 || minutes > TWO_MINUTE_LIMIT {
        return Err(FocusError::Validation(format!(
            "Two-minute tasks must be estimated between 1 and {TWO_MINUTE_LIMIT} minutes"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoMinuteStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub active_tasks: usize,
    /// Percentage, 0..=100.
    pub completion_rate: f64,
    pub average_completion_seconds: Option<f64>,
    pub today_completed: usize,
    pub current_streak: u32,
}

impl TwoMinuteStats {
    pub(crate) fn refresh_rate(&mut self) {
        self.completion_rate = if self.total_tasks == 0 {
            0.0
        } else {
            self.completed_tasks as f64 / self.total_tasks as f64 * 100.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimates_must_fit_the_rule() {
        assert!(TwoMinuteTask::validate(&TwoMinuteTaskDraft::new("u1", "File report", 2)).is_ok());
        assert!(TwoMinuteTask::validate(&TwoMinuteTaskDraft::new("u1", "File report", 3)).is_err());
        assert!(TwoMinuteTask::validate(&TwoMinuteTaskDraft::new("u1", "File report", 0)).is_err());
        assert!(TwoMinuteTask::validate(&TwoMinuteTaskDraft::new("u1", " ", 1)).is_err());

        let stretch = TwoMinuteTaskPatch {
            estimated_duration: Some(5),
            ..Default::default()
        };
        assert!(TwoMinuteTask::validate_patch(&stretch).is_err());
        assert!(TwoMinuteTask::validate_patch(&TwoMinuteTaskPatch::complete(Some(90))).is_ok());
    }

    #[test]
    fn recompleting_keeps_completion_time() {
        let now = Utc::now();
        let mut task = TwoMinuteTask::from_draft(
            RecordId::generate(),
            TwoMinuteTaskDraft::new("u1", "Reply to Sam", 1),
            now,
        );
        task.apply_patch(TwoMinuteTaskPatch::complete(None), now);
        task.apply_patch(TwoMinuteTaskPatch::complete(Some(80)), now + chrono::Duration::days(1));
        assert_eq!(task.completed_at, Some(now));
        assert_eq!(task.actual_duration_seconds, Some(80));

        let reopen = TwoMinuteTaskPatch {
            completed: Some(false),
            ..Default::default()
        };
        task.apply_patch(reopen, now);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn status_filter_defaults_to_active() {
        let task = TwoMinuteTask::from_draft(
            RecordId::generate(),
            TwoMinuteTaskDraft::new("u1", "Reply to Sam", 1),
            Utc::now(),
        );
        assert_eq!(task.category, DEFAULT_CATEGORY);
        assert!(task.matches(&TwoMinuteFilter::default()));
        assert!(!task.matches(&TwoMinuteFilter::with_status(TaskStatusFilter::Completed)));
    }

    #[test]
    fn completion_rate_handles_empty_set() {
        let mut stats = TwoMinuteStats::default();
        stats.refresh_rate();
        assert_eq!(stats.completion_rate, 0.0);

        stats.total_tasks = 4;
        stats.completed_tasks = 1;
        stats.refresh_rate();
        assert_eq!(stats.completion_rate, 25.0);
    }
}
