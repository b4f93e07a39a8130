use super::collection::Collection;
use super::{DataStore, Repository};
use crate::clock::Clock;
use crate::config::InsightsConfig;
use crate::error::{FocusError, Result};
use crate::insights::{aggregates, EnergyInsights, TwoMinuteInsights};
use crate::model::{
    EnergyLevel, GtdItem, GtdProject, ListParams, Page, PomodoroSession, PomodoroSettings,
    PomodoroStats, Record, RecordId, SettingsPatch, TimeEntry, TimeProject, TimeStats,
    TwoMinuteStats, TwoMinuteTask,
};
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Map-backed store for every entity type.
///
/// Uses `Cell` flags for failure injection so tests can flip them through a
/// shared reference after the store has been handed to the API.
pub struct MockStore {
    clock: Arc<dyn Clock>,
    insights: InsightsConfig,
    sessions: Collection<PomodoroSession>,
    gtd_items: Collection<GtdItem>,
    gtd_projects: Collection<GtdProject>,
    energy_levels: Collection<EnergyLevel>,
    time_entries: Collection<TimeEntry>,
    time_projects: Collection<TimeProject>,
    two_minute_tasks: Collection<TwoMinuteTask>,
    settings: HashMap<String, PomodoroSettings>,
    pomodoro_stats: HashMap<String, PomodoroStats>,
    time_stats: HashMap<String, TimeStats>,
    two_minute_stats: HashMap<String, TwoMinuteStats>,
    simulate_write_error: Cell<bool>,
    simulate_read_error: Cell<bool>,
}

impl MockStore {
    pub fn new(clock: Arc<dyn Clock>, insights: InsightsConfig) -> Self {
        Self {
            clock,
            insights,
            sessions: Collection::new(),
            gtd_items: Collection::new(),
            gtd_projects: Collection::new(),
            energy_levels: Collection::new(),
            time_entries: Collection::new(),
            time_projects: Collection::new(),
            two_minute_tasks: Collection::new(),
            settings: HashMap::new(),
            pomodoro_stats: HashMap::new(),
            time_stats: HashMap::new(),
            two_minute_stats: HashMap::new(),
            simulate_write_error: Cell::new(false),
            simulate_read_error: Cell::new(false),
        }
    }

    /// Make every write fail with a store error until switched off.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// Make every read fail with a store error until switched off.
    pub fn set_simulate_read_error(&self, simulate: bool) {
        self.simulate_read_error.set(simulate);
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Put a fully built record straight into its collection.
    ///
    /// Bypasses failure injection and stats refresh; callers finish with
    /// [`MockStore::refresh_all_stats`].
    pub fn insert<T: StoredRecord>(&mut self, record: T) {
        T::collection_mut(self).insert(record);
    }

    pub fn count<T: StoredRecord>(&self) -> usize {
        T::collection(self).len()
    }

    /// Recompute every stats record for every user that owns data.
    pub fn refresh_all_stats(&mut self) {
        let mut users = BTreeSet::new();
        users.extend(self.sessions.iter().map(|r| r.user_id.clone()));
        users.extend(self.time_entries.iter().map(|r| r.user_id.clone()));
        users.extend(self.two_minute_tasks.iter().map(|r| r.user_id.clone()));
        for user in users {
            self.refresh_pomodoro_stats(&user);
            self.refresh_time_stats(&user);
            self.refresh_two_minute_stats(&user);
        }
    }

    fn refresh_pomodoro_stats(&mut self, user_id: &str) {
        let stats = aggregates::pomodoro_stats(
            self.sessions.for_user(user_id),
            self.clock.now(),
            self.insights.streak_lookback_days,
        );
        self.pomodoro_stats.insert(user_id.to_string(), stats);
    }

    fn refresh_time_stats(&mut self, user_id: &str) {
        let stats = aggregates::time_stats(self.time_entries.for_user(user_id), self.clock.now());
        self.time_stats.insert(user_id.to_string(), stats);
    }

    fn refresh_two_minute_stats(&mut self, user_id: &str) {
        let stats = aggregates::two_minute_stats(
            self.two_minute_tasks.for_user(user_id),
            self.clock.now(),
            self.insights.streak_lookback_days,
        );
        self.two_minute_stats.insert(user_id.to_string(), stats);
    }

    fn check_read(&self) -> Result<()> {
        if self.simulate_read_error.get() {
            return Err(FocusError::Store("Simulated read error".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(FocusError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }
}

/// Ties an entity type to its collection inside [`MockStore`].
pub trait StoredRecord: Record {
    fn collection(store: &MockStore) -> &Collection<Self>;

    fn collection_mut(store: &mut MockStore) -> &mut Collection<Self>;

    /// Recompute whatever stats depend on this entity type.
    fn refresh_derived(_store: &mut MockStore, _user_id: &str) {}
}

macro_rules! stored {
    ($ty:ty, $field:ident $(, $refresh:ident)?) => {
        impl StoredRecord for $ty {
            fn collection(store: &MockStore) -> &Collection<Self> {
                &store.$field
            }

            fn collection_mut(store: &mut MockStore) -> &mut Collection<Self> {
                &mut store.$field
            }

            $(
                fn refresh_derived(store: &mut MockStore, user_id: &str) {
                    store.$refresh(user_id);
                }
            )?
        }
    };
}

stored!(PomodoroSession, sessions, refresh_pomodoro_stats);
stored!(GtdItem, gtd_items);
stored!(GtdProject, gtd_projects);
stored!(EnergyLevel, energy_levels);
stored!(TimeEntry, time_entries, refresh_time_stats);
stored!(TimeProject, time_projects);
stored!(TwoMinuteTask, two_minute_tasks, refresh_two_minute_stats);

impl<T: StoredRecord> Repository<T> for MockStore {
    fn list(&self, user_id: &str, params: &ListParams<T::Filter>) -> Result<Page<T>> {
        self.check_read()?;
        Ok(T::collection(self).page(user_id, params))
    }

    fn get(&self, id: &RecordId) -> Result<Option<T>> {
        self.check_read()?;
        Ok(T::collection(self).get(id).cloned())
    }

    fn create(&mut self, draft: T::Draft) -> Result<T> {
        self.check_write()?;
        let record = T::from_draft(RecordId::generate(), draft, self.clock.now());
        T::collection_mut(self).insert(record.clone());
        T::refresh_derived(self, record.user_id());
        Ok(record)
    }

    fn update(&mut self, id: &RecordId, patch: T::Patch) -> Result<Option<T>> {
        self.check_write()?;
        let now = self.clock.now();
        let Some(record) = T::collection_mut(self).get_mut(id) else {
            return Ok(None);
        };
        record.apply_patch(patch, now);
        let updated = record.clone();
        T::refresh_derived(self, updated.user_id());
        Ok(Some(updated))
    }

    fn delete(&mut self, id: &RecordId) -> Result<bool> {
        self.check_write()?;
        match T::collection_mut(self).remove(id) {
            Some(removed) => {
                T::refresh_derived(self, removed.user_id());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl DataStore for MockStore {
    fn settings(&self, user_id: &str) -> Result<PomodoroSettings> {
        self.check_read()?;
        Ok(self.settings.get(user_id).cloned().unwrap_or_default())
    }

    fn update_settings(&mut self, user_id: &str, patch: &SettingsPatch) -> Result<PomodoroSettings> {
        self.check_write()?;
        let now = self.clock.now();
        let settings = self.settings.entry(user_id.to_string()).or_default();
        settings.merge(patch, now);
        Ok(settings.clone())
    }

    fn pomodoro_stats(&self, user_id: &str) -> Result<PomodoroStats> {
        self.check_read()?;
        Ok(self.pomodoro_stats.get(user_id).cloned().unwrap_or_default())
    }

    fn time_stats(&self, user_id: &str) -> Result<TimeStats> {
        self.check_read()?;
        Ok(self.time_stats.get(user_id).cloned().unwrap_or_default())
    }

    fn two_minute_stats(&self, user_id: &str) -> Result<TwoMinuteStats> {
        self.check_read()?;
        Ok(self.two_minute_stats.get(user_id).cloned().unwrap_or_default())
    }

    fn energy_insights(&self, user_id: &str) -> Result<EnergyInsights> {
        self.check_read()?;
        Ok(EnergyInsights::compute(
            self.energy_levels.for_user(user_id),
            &self.insights,
        ))
    }

    fn two_minute_insights(&self, user_id: &str) -> Result<TwoMinuteInsights> {
        self.check_read()?;
        Ok(TwoMinuteInsights::compute(
            self.two_minute_tasks.for_user(user_id),
            self.clock.now(),
            &self.insights,
        ))
    }
}

// --- Test Fixtures ---
