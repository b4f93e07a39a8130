//! # API Facade
//!
//! The API layer is a **thin facade** over the store. It plays the part a REST
//! backend would: every call is a `Method` against a resource path, handled
//! in-process and synchronously.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Validates drafts and patches** before the store sees them
//!   (`Record::validate`, `Record::validate_patch`)
//! - **Logs** each request as `METHOD /resource` at debug level
//! - **Counts** requests, so callers can tell whether a read hit the store
//!
//! It holds no caching or optimistic state; that lives in [`crate::client`].
//!
//! ## Generic Over DataStore
//!
//! `FocusApi<S: DataStore>` is generic over the storage backend. The
//! application wires it to [`crate::store::MockStore`]; tests do the same with
//! a manual clock and failure injection.

use crate::error::Result;
use crate::insights::{EnergyInsights, TwoMinuteInsights};
use crate::model::{
    EntityKind, ListParams, Page, PomodoroSession, PomodoroSettings, PomodoroStats, Record,
    RecordId, SessionFilter, SettingsPatch, TimeEntry, TimeEntryFilter, TimeStats,
    TwoMinuteStats,
};
use crate::store::{DataStore, Repository};
use std::cell::Cell;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        })
    }
}

/// Collection path of an entity type.
pub fn resource(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::PomodoroSession => "/pomodoro/sessions",
        EntityKind::GtdItem => "/gtd/items",
        EntityKind::GtdProject => "/gtd/projects",
        EntityKind::EnergyLevel => "/energy/levels",
        EntityKind::TimeEntry => "/time/entries",
        EntityKind::TimeProject => "/time/projects",
        EntityKind::TwoMinuteTask => "/two-minute/tasks",
    }
}

/// The single entry point to the store.
pub struct FocusApi<S: DataStore> {
    store: S,
    requests: Cell<u64>,
}

impl<S: DataStore> FocusApi<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            requests: Cell::new(0),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Requests handled so far, failed ones included.
    pub fn request_count(&self) -> u64 {
        self.requests.get()
    }

    fn record(&self, method: Method, path: &str) {
        self.requests.set(self.requests.get() + 1);
        tracing::debug!(%method, path, "api request");
    }

    pub fn list<T: Record>(&self, user_id: &str, params: &ListParams<T::Filter>) -> Result<Page<T>>
    where
        S: Repository<T>,
    {
        self.record(Method::Get, resource(T::KIND));
        Repository::<T>::list(&self.store, user_id, params)
    }

    pub fn get<T: Record>(&self, id: &RecordId) -> Result<Option<T>>
    where
        S: Repository<T>,
    {
        self.record(Method::Get, &format!("{}/{id}", resource(T::KIND)));
        Repository::<T>::get(&self.store, id)
    }

    pub fn create<T: Record>(&mut self, draft: T::Draft) -> Result<T>
    where
        S: Repository<T>,
    {
        self.record(Method::Post, resource(T::KIND));
        T::validate(&draft)?;
        Repository::<T>::create(&mut self.store, draft)
    }

    pub fn update<T: Record>(&mut self, id: &RecordId, patch: T::Patch) -> Result<Option<T>>
    where
        S: Repository<T>,
    {
        self.record(Method::Patch, &format!("{}/{id}", resource(T::KIND)));
        T::validate_patch(&patch)?;
        Repository::<T>::update(&mut self.store, id, patch)
    }

    pub fn delete<T: Record>(&mut self, id: &RecordId) -> Result<bool>
    where
        S: Repository<T>,
    {
        self.record(Method::Delete, &format!("{}/{id}", resource(T::KIND)));
        Repository::<T>::delete(&mut self.store, id)
    }

    pub fn settings(&self, user_id: &str) -> Result<PomodoroSettings> {
        self.record(Method::Get, "/pomodoro/settings");
        self.store.settings(user_id)
    }

    pub fn update_settings(&mut self, user_id: &str, patch: &SettingsPatch) -> Result<PomodoroSettings> {
        self.record(Method::Patch, "/pomodoro/settings");
        self.store.update_settings(user_id, patch)
    }

    /// Most recent session that is neither completed nor interrupted.
    pub fn active_session(&self, user_id: &str) -> Result<Option<PomodoroSession>> {
        self.record(Method::Get, "/pomodoro/sessions/active");
        let open = SessionFilter {
            completed: Some(false),
            ..Default::default()
        };
        let page: Page<PomodoroSession> =
            Repository::<PomodoroSession>::list(&self.store, user_id, &ListParams::new(open, usize::MAX))?;
        Ok(page.items.into_iter().find(PomodoroSession::is_active))
    }

    /// The running timer, if any. Only the most recent one counts.
    pub fn active_timer(&self, user_id: &str) -> Result<Option<TimeEntry>> {
        self.record(Method::Get, "/time/entries/active");
        let running = TimeEntryFilter {
            running: Some(true),
            ..Default::default()
        };
        let page: Page<TimeEntry> =
            Repository::<TimeEntry>::list(&self.store, user_id, &ListParams::new(running, 1))?;
        Ok(page.items.into_iter().next())
    }

    pub fn pomodoro_stats(&self, user_id: &str) -> Result<PomodoroStats> {
        self.record(Method::Get, "/pomodoro/stats");
        self.store.pomodoro_stats(user_id)
    }

    pub fn time_stats(&self, user_id: &str) -> Result<TimeStats> {
        self.record(Method::Get, "/time/stats");
        self.store.time_stats(user_id)
    }

    pub fn two_minute_stats(&self, user_id: &str) -> Result<TwoMinuteStats> {
        self.record(Method::Get, "/two-minute/stats");
        self.store.two_minute_stats(user_id)
    }

    pub fn energy_insights(&self, user_id: &str) -> Result<EnergyInsights> {
        self.record(Method::Get, "/energy/insights");
        self.store.energy_insights(user_id)
    }

    pub fn two_minute_insights(&self, user_id: &str) -> Result<TwoMinuteInsights> {
        self.record(Method::Get, "/two-minute/insights");
        self.store.two_minute_insights(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FocusError;
    use crate::model::{
        EnergyLevel, EnergyLevelDraft, EnergyLevelPatch, GtdItem, GtdItemDraft, GtdItemPatch,
        SessionDraft, SessionPatch, SessionType, TimeEntryDraft, TimeEntryPatch, TwoMinuteTask,
        TwoMinuteTaskDraft,
    };
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::MockStore;

    fn api() -> FocusApi<MockStore> {
        FocusApi::new(StoreFixture::new().store)
    }

    #[test]
    fn invalid_drafts_never_reach_the_store() {
        let mut api = api();
        let err = api
            .create::<TwoMinuteTask>(TwoMinuteTaskDraft::new("u1", "Too long", 5))
            .unwrap_err();
        assert!(matches!(err, FocusError::Validation(_)));
        let err = api
            .create::<EnergyLevel>(EnergyLevelDraft::new("u1", 11))
            .unwrap_err();
        assert!(matches!(err, FocusError::Validation(_)));
        assert_eq!(api.store().count::<TwoMinuteTask>(), 0);
        assert_eq!(api.request_count(), 2);
    }

    #[test]
    fn invalid_patches_never_reach_the_store() {
        let mut api = api();
        let level: EnergyLevel = api.create(EnergyLevelDraft::new("u1", 6)).unwrap();
        let err = api
            .update::<EnergyLevel>(
                &level.id,
                EnergyLevelPatch {
                    level: Some(11),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, FocusError::Validation(_)));
        assert_eq!(api.get::<EnergyLevel>(&level.id).unwrap(), Some(level));

        let item: GtdItem = api.create(GtdItemDraft::capture("u1", "Call mom")).unwrap();
        let blank = GtdItemPatch {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(api.update::<GtdItem>(&item.id, blank).is_err());
        assert_eq!(api.get::<GtdItem>(&item.id).unwrap().unwrap().title, "Call mom");
    }

    #[test]
    fn every_call_is_counted() {
        let mut api = api();
        let item: GtdItem = api.create(GtdItemDraft::capture("u1", "Call mom")).unwrap();
        let _ = api.get::<GtdItem>(&item.id).unwrap();
        let _ = api.settings("u1").unwrap();
        assert_eq!(api.request_count(), 3);

        api.store().set_simulate_read_error(true);
        assert!(api.get::<GtdItem>(&item.id).is_err());
        assert_eq!(api.request_count(), 4);
    }

    #[test]
    fn active_session_skips_finished_ones() {
        let mut api = api();
        let done: PomodoroSession = api
            .create(SessionDraft::new("u1", SessionType::Work, 25))
            .unwrap();
        api.update::<PomodoroSession>(
            &done.id,
            SessionPatch {
                completed: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(api.active_session("u1").unwrap(), None);

        let open: PomodoroSession = api
            .create(SessionDraft::new("u1", SessionType::ShortBreak, 5))
            .unwrap();
        assert_eq!(api.active_session("u1").unwrap().map(|s| s.id), Some(open.id));
    }

    #[test]
    fn active_timer_clears_when_stopped() {
        let mut api = api();
        let entry: TimeEntry = api.create(TimeEntryDraft::running("u1", "Writing")).unwrap();
        assert_eq!(api.active_timer("u1").unwrap().map(|e| e.id), Some(entry.id.clone()));

        api.update::<TimeEntry>(&entry.id, TimeEntryPatch::stop()).unwrap();
        assert_eq!(api.active_timer("u1").unwrap(), None);
    }

    #[test]
    fn resources_are_distinct() {
        let kinds = [
            EntityKind::PomodoroSession,
            EntityKind::GtdItem,
            EntityKind::GtdProject,
            EntityKind::EnergyLevel,
            EntityKind::TimeEntry,
            EntityKind::TimeProject,
            EntityKind::TwoMinuteTask,
        ];
        let paths: std::collections::HashSet<_> = kinds.iter().map(|k| resource(*k)).collect();
        assert_eq!(paths.len(), kinds.len());
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }
}
