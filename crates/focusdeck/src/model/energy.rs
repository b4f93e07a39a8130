use super::{touch, EntityKind, Record, RecordId};
use crate::error::{FocusError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_ENERGY: u8 = 1;
pub const MAX_ENERGY: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Great,
    Good,
    Neutral,
    Low,
    Drained,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyLevel {
    pub id: RecordId,
    pub user_id: String,
    pub level: u8,
    pub mood: Option<Mood>,
    pub recorded_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EnergyLevelDraft {
    pub user_id: String,
    pub level: u8,
    pub mood: Option<Mood>,
    /// Defaults to the creation time.
    pub recorded_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl EnergyLevelDraft {
    pub fn new(user_id: impl Into<String>, level: u8) -> Self {
        Self {
            user_id: user_id.into(),
            level,
            mood: None,
            recorded_at: None,
            notes: None,
        }
    }

    pub fn recorded_at(mut self, at: DateTime<Utc>) -> Self {
        self.recorded_at = Some(at);
        self
    }

    pub fn with_mood(mut self, mood: Mood) -> Self {
        self.mood = Some(mood);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnergyLevelPatch {
    pub level: Option<u8>,
    pub mood: Option<Mood>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EnergyFilter {
    pub since: Option<DateTime<Utc>>,
    pub min_level: Option<u8>,
}

impl Record for EnergyLevel {
    const KIND: EntityKind = EntityKind::EnergyLevel;

    type Draft = EnergyLevelDraft;
    type Patch = EnergyLevelPatch;
    type Filter = EnergyFilter;

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
        self.recorded_at
    }

    fn matches(&self, filter: &EnergyFilter) -> bool {
        filter.since.map_or(true, |since| self.recorded_at >= since)
            && filter.min_level.map_or(true, |min| self.level >= min)
    }

    fn validate(draft: &EnergyLevelDraft) -> Result<()> {
        check_level(draft.level)
    }

    fn validate_patch(patch: &EnergyLevelPatch) -> Result<()> {
        patch.level.map_or(Ok(()), check_level)
    }

    fn from_draft(id: RecordId, draft: EnergyLevelDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: draft.user_id,
            level: draft.level,
            mood: draft.mood,
            recorded_at: draft.recorded_at.unwrap_or(now),
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: EnergyLevelPatch, now: DateTime<Utc>) {
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(mood) = patch.mood {
            self.mood = Some(mood);
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        self.updated_at = touch(self.created_at, now);
    }
}

fn check_level(level: u8) -> Result<()> {
    if !(MIN_ENERGY..=MAX_ENERGY).contains(&level) {
        return Err(FocusError::Validation(format!(
            "Energy level must be between {MIN_ENERGY} and {MAX_ENERGY}, got {level}"
        )));
    }
    Ok(())
}
