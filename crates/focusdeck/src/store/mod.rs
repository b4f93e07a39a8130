//! # Storage Layer
//!
//! The store is the single source of truth for every entity collection. It is
//! an explicitly constructed value, never a global: the composition root builds
//! one, seeds it and hands it to the [`crate::api::FocusApi`].
//!
//! ## Contract
//!
//! Every entity type gets the same five operations through [`Repository`]:
//!
//! | Operation | Result | Missing id |
//! |---|---|---|
//! | `list(user, params)` | [`Page`] sorted newest first | - |
//! | `get(id)` | `Option<T>` | `None` |
//! | `create(draft)` | stored record with id and timestamps | - |
//! | `update(id, patch)` | merged record, `updated_at` refreshed | `None` |
//! | `delete(id)` | whether a record existed | `false` |
//!
//! Not-found is never an error. Errors are reserved for store failures, which
//! the in-memory implementation can simulate on demand.
//!
//! ## Derived Stats
//!
//! [`DataStore`] also serves one settings record and three stats records per
//! user. Stats are recomputed synchronously after every write that touches
//! their entity type, so they always reflect the collections. Insight views
//! are not stored at all and are rebuilt on each call.
//!
//! ## Implementations
//!
//! - [`memory::MockStore`]: map-backed store with failure injection.
//! - [`seed`]: deterministic synthetic data for a demo user.

use crate::error::Result;
use crate::insights::{EnergyInsights, TwoMinuteInsights};
use crate::model::{
    EnergyLevel, GtdItem, GtdProject, ListParams, Page, PomodoroSession, PomodoroSettings,
    PomodoroStats, Record, RecordId, SettingsPatch, TimeEntry, TimeProject, TimeStats,
    TwoMinuteStats, TwoMinuteTask,
};

pub mod collection;
pub mod memory;
pub mod seed;

pub use collection::Collection;
pub use memory::MockStore;

/// Uniform CRUD + pagination over one entity type.
pub trait Repository<T: Record> {
    fn list(&self, user_id: &str, params: &ListParams<T::Filter>) -> Result<Page<T>>;

    fn get(&self, id: &RecordId) -> Result<Option<T>>;

    fn create(&mut self, draft: T::Draft) -> Result<T>;

    fn update(&mut self, id: &RecordId, patch: T::Patch) -> Result<Option<T>>;

    fn delete(&mut self, id: &RecordId) -> Result<bool>;
}

/// Everything the application reads and writes.
pub trait DataStore:
    Repository<PomodoroSession>
    + Repository<GtdItem>
    + Repository<GtdProject>
    + Repository<EnergyLevel>
    + Repository<TimeEntry>
    + Repository<TimeProject>
    + Repository<TwoMinuteTask>
{
    /// The user's settings, or defaults if none were ever saved.
    fn settings(&self, user_id: &str) -> Result<PomodoroSettings>;

    /// Merge `patch` into the user's settings and return the result.
    fn update_settings(&mut self, user_id: &str, patch: &SettingsPatch) -> Result<PomodoroSettings>;

    fn pomodoro_stats(&self, user_id: &str) -> Result<PomodoroStats>;

    fn time_stats(&self, user_id: &str) -> Result<TimeStats>;

    fn two_minute_stats(&self, user_id: &str) -> Result<TwoMinuteStats>;

    /// Recomputed from the user's energy log on every call.
    fn energy_insights(&self, user_id: &str) -> Result<EnergyInsights>;

    /// Recomputed from the user's two-minute tasks on every call.
    fn two_minute_insights(&self, user_id: &str) -> Result<TwoMinuteInsights>;
}
