use super::{require_text, touch, EntityKind, Record, RecordId};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GtdCategory {
    Inbox,
    NextAction,
    WaitingFor,
    SomedayMaybe,
    Project,
    Reference,
}

impl GtdCategory {
    /// Categories that have their own context view.
    pub const VIEWS: [GtdCategory; 4] = [
        GtdCategory::Inbox,
        GtdCategory::NextAction,
        GtdCategory::WaitingFor,
        GtdCategory::SomedayMaybe,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

impl Subtask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GtdItem {
    pub id: RecordId,
    pub user_id: String,
    pub title: String,
    pub notes: Option<String>,
    pub category: GtdCategory,
    pub context: Option<String>,
    pub priority: Priority,
    pub project_id: Option<RecordId>,
    pub waiting_on: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub remind_at: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<u32>,
    pub subtasks: Vec<Subtask>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct GtdItemDraft {
    pub user_id: String,
    pub title: String,
    pub notes: Option<String>,
    pub category: GtdCategory,
    pub context: Option<String>,
    pub priority: Priority,
    pub project_id: Option<RecordId>,
    pub waiting_on: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub remind_at: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<u32>,
    pub subtasks: Vec<Subtask>,
}

impl GtdItemDraft {
    /// A bare capture: lands in the inbox with medium priority.
    pub fn capture(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            title: title.into(),
            notes: None,
            category: GtdCategory::Inbox,
            context: None,
            priority: Priority::Medium,
            project_id: None,
            waiting_on: None,
            due_date: None,
            remind_at: None,
            estimated_minutes: None,
            subtasks: Vec::new(),
        }
    }

    pub fn in_category(mut self, category: GtdCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_subtasks<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subtasks = titles.into_iter().map(Subtask::new).collect();
        self
    }

    pub fn remind_at(mut self, at: DateTime<Utc>) -> Self {
        self.remind_at = Some(at);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct GtdItemPatch {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub category: Option<GtdCategory>,
    pub context: Option<String>,
    pub priority: Option<Priority>,
    pub project_id: Option<RecordId>,
    pub waiting_on: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub remind_at: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<u32>,
    pub completed: Option<bool>,
    /// `(subtask id, completed)` pairs; each sets the subtask to that exact state.
    pub subtask_states: Vec<(String, bool)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GtdFilter {
    pub category: Option<GtdCategory>,
    pub completed: Option<bool>,
    pub project_id: Option<RecordId>,
    pub context: Option<String>,
}

impl GtdFilter {
    /// Open items of one category, the shape of a context view.
    pub fn view(category: GtdCategory) -> Self {
        Self {
            category: Some(category),
            completed: Some(false),
            ..Default::default()
        }
    }
}

impl Record for GtdItem {
    const KIND: EntityKind = EntityKind::GtdItem;

    type Draft = GtdItemDraft;
    type Patch = GtdItemPatch;
    type Filter = GtdFilter;

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

    fn matches(&self, filter: &GtdFilter) -> bool {
        filter.category.map_or(true, |c| c == self.category)
            && filter.completed.map_or(true, |c| c == self.completed)
            && filter
                .project_id
                .as_ref()
                .map_or(true, |p| self.project_id.as_ref() == Some(p))
            && filter
                .context
                .as_deref()
                .map_or(true, |c| self.context.as_deref() == Some(c))
    }

    fn validate(draft: &GtdItemDraft) -> Result<()> {
        require_text("Title", &draft.title)
    }

    fn validate_patch(patch: &GtdItemPatch) -> Result<()> {
        patch.title.as_deref().map_or(Ok(()), |title| require_text("Title", title))
    }

    fn from_draft(id: RecordId, draft: GtdItemDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: draft.user_id,
            title: draft.title.trim().to_string(),
            notes: draft.notes,
            category: draft.category,
            context: draft.context,
            priority: draft.priority,
            project_id: draft.project_id,
            waiting_on: draft.waiting_on,
            due_date: draft.due_date,
            remind_at: draft.remind_at,
            estimated_minutes: draft.estimated_minutes,
            subtasks: draft.subtasks,
            completed: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: GtdItemPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(context) = patch.context {
            self.context = Some(context);
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = Some(project_id);
        }
        if let Some(waiting_on) = patch.waiting_on {
            self.waiting_on = Some(waiting_on);
        }
        if let Some(due) = patch.due_date {
            self.due_date = Some(due);
        }
        if let Some(remind_at) = patch.remind_at {
            self.remind_at = Some(remind_at);
        }
        if let Some(minutes) = patch.estimated_minutes {
            self.estimated_minutes = Some(minutes);
        }
        if let Some(completed) = patch.completed {
            if !completed {
                self.completed_at = None;
            } else if !self.completed {
                self.completed_at = Some(now);
            }
            self.completed = completed;
        }
        for (subtask_id, completed) in patch.subtask_states {
            if let Some(subtask) = self.subtasks.iter_mut().find(|s| s.id == subtask_id) {
                subtask.completed = completed;
            }
        }
        self.updated_at = touch(self.created_at, now);
    }
}

impl GtdItem {
    pub fn subtask(&self, subtask_id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == subtask_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Active,
    OnHold,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GtdProject {
    pub id: RecordId,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub next_action_id: Option<RecordId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct GtdProjectDraft {
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
}

impl GtdProjectDraft {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GtdProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub next_action_id: Option<RecordId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GtdProjectFilter {
    pub status: Option<ProjectStatus>,
}

impl Record for GtdProject {
    const KIND: EntityKind = EntityKind::GtdProject;

    type Draft = GtdProjectDraft;
    type Patch = GtdProjectPatch;
    type Filter = GtdProjectFilter;

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

    fn matches(&self, filter: &GtdProjectFilter) -> bool {
        filter.status.map_or(true, |s| s == self.status)
    }

    fn validate(draft: &GtdProjectDraft) -> Result<()> {
        require_text("Project name", &draft.name)
    }

    fn validate_patch(patch: &GtdProjectPatch) -> Result<()> {
        patch.name.as_deref().map_or(Ok(()), |name| require_text("Project name", name))
    }

    fn from_draft(id: RecordId, draft: GtdProjectDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: draft.user_id,
            name: draft.name.trim().to_string(),
            description: draft.description,
            status: ProjectStatus::Active,
            next_action_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: GtdProjectPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(next) = patch.next_action_id {
            self.next_action_id = Some(next);
        }
        self.updated_at = touch(self.created_at, now);
    }
}
