//! # Local Storage
//!
//! Two slots survive between sessions, outside the store:
//!
//! - **Preferences**: a flat JSON object of UI settings. Every change merges
//!   into what is on disk, so keys written by other versions are kept.
//!   An unreadable slot yields defaults.
//! - **Manual time log**: a JSON array of entries the user typed in by hand,
//!   with RFC 3339 timestamps.
//!
//! Both go through a [`KvBackend`]: [`FsKv`] in the application, [`MemKv`] in
//! tests.

use crate::error::{FocusError, Result};
use crate::model::require_text;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod backend;

pub use backend::{FsKv, KvBackend, MemKv};

pub const PREFERENCES_KEY: &str = "focusdeck-preferences";
pub const MANUAL_ENTRIES_KEY: &str = "focusdeck-manual-time-entries";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub current_view: String,
    pub last_list: Option<String>,
    pub theme: Theme,
    pub sidebar_collapsed: bool,
    pub show_completed: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            current_view: "today".to_string(),
            last_list: None,
            theme: Theme::System,
            sidebar_collapsed: false,
            show_completed: false,
        }
    }
}

/// Fields to change; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_list: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidebar_collapsed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_completed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntry {
    pub id: String,
    pub description: String,
    pub project: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl ManualEntry {
    pub fn new(description: impl Into<String>, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            description: description.into(),
            project: None,
            start_time,
            end_time,
        }
    }

    pub fn for_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

pub struct LocalStorage<B: KvBackend> {
    backend: B,
}

impl<B: KvBackend> LocalStorage<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn preferences(&self) -> Preferences {
        serde_json::from_value(Value::Object(self.stored_preferences()))
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "preferences slot has bad values, using defaults");
                Preferences::default()
            })
    }

    /// Merge `patch` into the stored object and persist it.
    pub fn update_preferences(&self, patch: &PreferencesPatch) -> Result<Preferences> {
        let mut stored = self.stored_preferences();
        if let Value::Object(fields) = serde_json::to_value(patch)? {
            stored.extend(fields);
        }
        let merged = Value::Object(stored);
        self.backend
            .set(PREFERENCES_KEY, &serde_json::to_string(&merged)?)?;
        Ok(serde_json::from_value(merged).unwrap_or_default())
    }

    pub fn manual_entries(&self) -> Result<Vec<ManualEntry>> {
        match self.backend.get(MANUAL_ENTRIES_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn add_manual_entry(&self, entry: ManualEntry) -> Result<Vec<ManualEntry>> {
        require_text("Description", &entry.description)?;
        if entry.end_time < entry.start_time {
            return Err(FocusError::Validation(
                "Entry cannot end before it starts".to_string(),
            ));
        }
        let mut entries = self.manual_entries()?;
        entries.push(entry);
        self.save_entries(&entries)?;
        Ok(entries)
    }

    /// Returns whether an entry with `id` was removed.
    pub fn remove_manual_entry(&self, id: &str) -> Result<bool> {
        let mut entries = self.manual_entries()?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.save_entries(&entries)?;
        Ok(true)
    }

    fn save_entries(&self, entries: &[ManualEntry]) -> Result<()> {
        self.backend
            .set(MANUAL_ENTRIES_KEY, &serde_json::to_string(entries)?)
    }

    /// The stored object, or an empty one when missing or unreadable.
    fn stored_preferences(&self) -> Map<String, Value> {
        let raw = match self.backend.get(PREFERENCES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Map::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read preferences");
                return Map::new();
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) | Err(_) => {
                tracing::warn!("preferences slot is corrupt, using defaults");
                Map::new()
            }
        }
    }
}
