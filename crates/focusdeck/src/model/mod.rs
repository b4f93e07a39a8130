//! # Domain Model
//!
//! Every entity the store owns implements [`Record`]: it has a [`RecordId`], an owning
//! user, creation/update timestamps and a descending sort field used by cursor
//! pagination. Entities are created from a typed `Draft` and mutated with a typed
//! `Patch` whose fields are all optional (unspecified fields keep their value).
//!
//! ## Identifiers
//!
//! Store-assigned ids are UUIDs. The client layer inserts optimistic records before
//! the store has answered; those carry [`RecordId::Temp`] placeholders rendered as
//! `temp-<n>`. Both kinds serialize as plain strings.
//!
//! ## Pages
//!
//! [`Page`] is a window of a sorted, filtered collection. `total` counts every
//! record matching the user and filter, `next_cursor` is the id of the last item
//! when more remain.

use crate::error::{FocusError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use uuid::Uuid;

pub mod energy;
pub mod gtd;
pub mod pomodoro;
pub mod time_tracking;
pub mod two_minute;

pub use energy::{EnergyFilter, EnergyLevel, EnergyLevelDraft, EnergyLevelPatch, Mood};
pub use gtd::{
    GtdCategory, GtdFilter, GtdItem, GtdItemDraft, GtdItemPatch, GtdProject, GtdProjectDraft,
    GtdProjectFilter, GtdProjectPatch, Priority, ProjectStatus, Subtask,
};
pub use pomodoro::{
    PomodoroSession, PomodoroSettings, PomodoroStats, SessionDraft, SessionFilter, SessionPatch,
    SessionType, SettingsPatch,
};
pub use time_tracking::{
    ProjectMinutes, TimeEntry, TimeEntryDraft, TimeEntryFilter, TimeEntryPatch, TimeProject,
    TimeProjectDraft, TimeProjectFilter, TimeProjectPatch, TimeStats,
};
pub use two_minute::{
    TaskStatusFilter, TwoMinuteFilter, TwoMinuteStats, TwoMinuteTask, TwoMinuteTaskDraft,
    TwoMinuteTaskPatch,
};

const TEMP_PREFIX: &str = "temp-";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RecordId {
    Stored(Uuid),
    Temp(u64),
}

impl RecordId {
    pub fn generate() -> Self {
        Self::Stored(Uuid::new_v4())
    }

    pub fn is_temp(&self) -> bool {
        matches!(self, Self::Temp(_))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored(id) => write!(f, "{id}"),
            Self::Temp(n) => write!(f, "{TEMP_PREFIX}{n}"),
        }
    }
}

impl FromStr for RecordId {
    type Err = FocusError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix(TEMP_PREFIX) {
            return rest
                .parse()
                .map(Self::Temp)
                .map_err(|_| FocusError::Validation(format!("Malformed placeholder id: {s}")));
        }
        Uuid::parse_str(s)
            .map(Self::Stored)
            .map_err(|_| FocusError::Validation(format!("Malformed record id: {s}")))
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for RecordId {
    type Error = FocusError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    PomodoroSession,
    GtdItem,
    GtdProject,
    EnergyLevel,
    TimeEntry,
    TimeProject,
    TwoMinuteTask,
}

impl EntityKind {
    /// Human wording for messages.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::PomodoroSession => "session",
            EntityKind::GtdItem => "item",
            EntityKind::GtdProject => "project",
            EntityKind::EnergyLevel => "energy entry",
            EntityKind::TimeEntry => "time entry",
            EntityKind::TimeProject => "time project",
            EntityKind::TwoMinuteTask => "two-minute task",
        }
    }
}

/// A record owned by the store.
pub trait Record: Clone + fmt::Debug + PartialEq + Serialize {
    const KIND: EntityKind;

    type Draft: Clone + fmt::Debug;
    type Patch: Clone + fmt::Debug + Default;
    type Filter: Clone + fmt::Debug + Default + PartialEq + Eq + Hash;

    fn id(&self) -> &RecordId;
    fn user_id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;

    /// Field the collection is sorted on, newest first.
    fn sort_key(&self) -> DateTime<Utc>;

    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Reject drafts the store must never see.
    fn validate(_draft: &Self::Draft) -> Result<()> {
        Ok(())
    }

    /// Reject patches that would leave a record the store must never hold.
    fn validate_patch(_patch: &Self::Patch) -> Result<()> {
        Ok(())
    }

    fn from_draft(id: RecordId, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// Merge `patch` into `self`. Implementations refresh `updated_at`.
    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>);
}

/// `updated_at` never goes behind `created_at`.
pub(crate) fn touch(created_at: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    now.max(created_at)
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FocusError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListParams<F> {
    pub filter: F,
    pub cursor: Option<RecordId>,
    pub limit: usize,
}

impl<F: Default> Default for ListParams<F> {
    fn default() -> Self {
        Self {
            filter: F::default(),
            cursor: None,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl<F> ListParams<F> {
    pub fn new(filter: F, limit: usize) -> Self {
        Self {
            filter,
            cursor: None,
            limit,
        }
    }

    pub fn after(mut self, cursor: RecordId) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn is_first_page(&self) -> bool {
        self.cursor.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub has_next: bool,
    pub next_cursor: Option<RecordId>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            has_next: false,
            next_cursor: None,
        }
    }
}

impl<T: Record> Page<T> {
    pub fn contains(&self, id: &RecordId) -> bool {
        self.items.iter().any(|item| item.id() == id)
    }

    pub fn find(&self, id: &RecordId) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Put `record` at the head, keeping the window at `limit` items.
    pub fn insert_head(&mut self, record: T, limit: usize) {
        self.items.insert(0, record);
        self.total += 1;
        if self.items.len() > limit.max(1) {
            self.items.truncate(limit.max(1));
            self.has_next = true;
            self.next_cursor = self.items.last().map(|item| item.id().clone());
        }
    }

    /// Swap the item with id `id` for `record`. Returns whether it was present.
    pub fn replace(&mut self, id: &RecordId, record: &T) -> bool {
        let mut found = false;
        for item in self.items.iter_mut().filter(|item| item.id() == id) {
            *item = record.clone();
            found = true;
        }
        if found && self.next_cursor.as_ref() == Some(id) {
            self.next_cursor = Some(record.id().clone());
        }
        found
    }

    pub fn remove(&mut self, id: &RecordId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id() != id);
        let removed = self.items.len() != before;
        if removed {
            self.total = self.total.saturating_sub(1);
            if self.next_cursor.as_ref() == Some(id) {
                self.next_cursor = self.items.last().map(|item| item.id().clone());
            }
        }
        removed
    }
}
