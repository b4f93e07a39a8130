use super::{require_text, touch, EntityKind, Record, RecordId};
use crate::error::{FocusError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: RecordId,
    pub user_id: String,
    pub description: String,
    pub project_id: Option<RecordId>,
    pub task_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub billable: bool,
    pub is_running: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeEntry {
    /// Whole minutes between start and end; `None` while the timer runs.
    pub fn duration_minutes(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_minutes().max(0))
    }
}

#[derive(Debug, Clone)]
pub struct TimeEntryDraft {
    pub user_id: String,
    pub description: String,
    pub project_id: Option<RecordId>,
    pub task_id: Option<String>,
    /// Defaults to the creation time.
    pub start_time: Option<DateTime<Utc>>,
    /// `None` starts a running timer.
    pub end_time: Option<DateTime<Utc>>,
    pub billable: bool,
}

impl TimeEntryDraft {
    pub fn running(user_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            description: description.into(),
            project_id: None,
            task_id: None,
            start_time: None,
            end_time: None,
            billable: false,
        }
    }

    pub fn logged(
        user_id: impl Into<String>,
        description: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            start_time: Some(start),
            end_time: Some(end),
            ..Self::running(user_id, description)
        }
    }

    pub fn for_project(mut self, project_id: RecordId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn billable(mut self) -> Self {
        self.billable = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimeEntryPatch {
    pub description: Option<String>,
    pub project_id: Option<RecordId>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub billable: Option<bool>,
    /// `Some(false)` stops the timer, stamping `end_time` if none was given.
    pub is_running: Option<bool>,
}

impl TimeEntryPatch {
    pub fn stop() -> Self {
        Self {
            is_running: Some(false),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TimeEntryFilter {
    pub project_id: Option<RecordId>,
    pub running: Option<bool>,
}

impl Record for TimeEntry {
    const KIND: EntityKind = EntityKind::TimeEntry;

    type Draft = TimeEntryDraft;
    type Patch = TimeEntryPatch;
    type Filter = TimeEntryFilter;

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
        self.start_time
    }

    fn matches(&self, filter: &TimeEntryFilter) -> bool {
        filter
            .project_id
            .as_ref()
            .map_or(true, |p| self.project_id.as_ref() == Some(p))
            && filter.running.map_or(true, |r| r == self.is_running)
    }

    fn validate(draft: &TimeEntryDraft) -> Result<()> {
        check_span(draft.start_time, draft.end_time)
    }

    fn validate_patch(patch: &TimeEntryPatch) -> Result<()> {
        check_span(patch.start_time, patch.end_time)
    }

    fn from_draft(id: RecordId, draft: TimeEntryDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: draft.user_id,
            description: draft.description,
            project_id: draft.project_id,
            task_id: draft.task_id,
            start_time: draft.start_time.unwrap_or(now),
            is_running: draft.end_time.is_none(),
            end_time: draft.end_time,
            billable: draft.billable,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: TimeEntryPatch, now: DateTime<Utc>) {
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = Some(project_id);
        }
        if let Some(start) = patch.start_time {
            self.start_time = start;
        }
        if let Some(billable) = patch.billable {
            self.billable = billable;
        }
        if let Some(end) = patch.end_time {
            self.end_time = Some(end);
            self.is_running = false;
        }
        match patch.is_running {
            Some(false) => {
                self.is_running = false;
                if self.end_time.is_none() {
                    self.end_time = Some(now.max(self.start_time));
                }
            }
            Some(true) => {
                self.is_running = true;
                self.end_time = None;
            }
            None => {}
        }
        self.updated_at = touch(self.created_at, now);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeProject {
    pub id: RecordId,
    pub user_id: String,
    pub name: String,
    pub color: String,
    pub hourly_rate: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TimeProjectDraft {
    pub user_id: String,
    pub name: String,
    pub color: String,
    pub hourly_rate: Option<f64>,
}

impl TimeProjectDraft {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            color: "#6366f1".to_string(),
            hourly_rate: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimeProjectPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub hourly_rate: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TimeProjectFilter {
    pub active: Option<bool>,
}

impl Record for TimeProject {
    const KIND: EntityKind = EntityKind::TimeProject;

    type Draft = TimeProjectDraft;
    type Patch = TimeProjectPatch;
    type Filter = TimeProjectFilter;

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

    fn matches(&self, filter: &TimeProjectFilter) -> bool {
        filter.active.map_or(true, |a| a == self.is_active)
    }

    fn validate(draft: &TimeProjectDraft) -> Result<()> {
        require_text("Project name", &draft.name)?;
        check_rate(draft.hourly_rate)
    }

    fn validate_patch(patch: &TimeProjectPatch) -> Result<()> {
        if let Some(name) = &patch.name {
            require_text("Project name", name)?;
        }
        check_rate(patch.hourly_rate)
    }

    fn from_draft(id: RecordId, draft: TimeProjectDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: draft.user_id,
            name: draft.name.trim().to_string(),
            color: draft.color,
            hourly_rate: draft.hourly_rate,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: TimeProjectPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(rate) = patch.hourly_rate {
            self.hourly_rate = Some(rate);
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
        self.updated_at = touch(self.created_at, now);
    }
}

fn check_span(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(FocusError::Validation(
                "Time entry cannot end before it starts".to_string(),
            ));
        }
    }
    Ok(())
}

fn check_rate(rate: Option<f64>) -> Result<()> {
    if rate.is_some_and(|rate| rate < 0.0) {
        return Err(FocusError::Validation(
            "Hourly rate cannot be negative".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMinutes {
    pub project_id: Option<RecordId>,
    pub minutes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeStats {
    pub entry_count: usize,
    pub total_minutes: i64,
    pub today_minutes: i64,
    pub week_minutes: i64,
    pub billable_minutes: i64,
    /// Largest share first.
    pub by_project: Vec<ProjectMinutes>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn stopping_a_timer_stamps_end_time() {
        let start = Utc::now();
        let mut entry = TimeEntry::from_draft(
            RecordId::generate(),
            TimeEntryDraft::running("u1", "Deep work"),
            start,
        );
        assert!(entry.is_running);
        assert_eq!(entry.duration_minutes(), None);

        entry.apply_patch(TimeEntryPatch::stop(), start + Duration::minutes(42));
        assert!(!entry.is_running);
        assert_eq!(entry.duration_minutes(), Some(42));
    }

    #[test]
    fn logged_entries_are_not_running() {
        let end = Utc::now();
        let draft = TimeEntryDraft::logged("u1", "Review", end - Duration::hours(1), end);
        let entry = TimeEntry::from_draft(RecordId::generate(), draft, end);
        assert!(!entry.is_running);
        assert_eq!(entry.duration_minutes(), Some(60));
    }

    #[test]
    fn entries_cannot_end_before_start() {
        let now = Utc::now();
        let draft = TimeEntryDraft::logged("u1", "Oops", now, now - Duration::minutes(1));
        assert!(TimeEntry::validate(&draft).is_err());
    }

    #[test]
    fn negative_rates_are_rejected() {
        let mut draft = TimeProjectDraft::new("u1", "Client");
        draft.hourly_rate = Some(-1.0);
        assert!(TimeProject::validate(&draft).is_err());
    }
}
