//! # Client
//!
//! [`FocusClient`] is what a UI talks to. It owns the [`FocusApi`], the
//! [`QueryCache`] and the [`Services`], and runs every read and write through
//! the cache.
//!
//! ## Queries
//!
//! [`FocusClient::query`] returns cached data when it is fresh under the
//! key's [`QueryPolicy`] and fetches otherwise. A failed fetch keeps the last
//! data and records the error on the entry. [`FocusClient::start_fetch`] and
//! [`FocusClient::finish_fetch`] split a fetch in two so a write can land in
//! between; the late result is then discarded.
//!
//! [`FocusClient::tick`] drives polling and garbage collection;
//! [`FocusClient::on_window_focus`] refetches stale observed keys.
//!
//! ## Mutations
//!
//! Every write is a [`Mutation`] and runs in strict order:
//!
//! 1. cancel in-flight fetches in its scope
//! 2. snapshot the scope
//! 3. apply the optimistic change
//! 4. call the store
//! 5. on failure restore the snapshot and show an error toast
//! 6. on success reconcile, invalidate, and run side effects
//!
//! [`FocusClient::begin`] covers steps 1-3 and [`FocusClient::settle`] steps
//! 4-6, so callers can interleave writes the way overlapping UI handlers
//! would. Failures are reported as [`MutationResult::RolledBack`], never as
//! errors.

use crate::api::FocusApi;
use crate::cache::policy::secs;
use crate::cache::{
    CacheData, CacheEvent, CacheEntry, FetchTicket, KeyMatcher, Query, QueryCache, QueryKey,
    QueryKind, QueryPolicy, SubscriptionId,
};
use crate::clock::Clock;
use crate::config::CacheConfig;
use crate::error::Result;
use crate::model::{
    EnergyLevel, GtdFilter, GtdItem, GtdProject, ListParams, PomodoroSession, RecordId,
    TimeEntry, TimeProject, TwoMinuteTask,
};
use crate::services::{MessageLevel, Services};
use crate::store::DataStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub mod energy;
pub mod gtd;
pub mod mutation;
pub mod pomodoro;
pub mod time_tracking;
pub mod two_minute;

pub use mutation::{
    CreateRecord, DeleteRecord, Mutation, MutationResult, OptimisticContext, PendingMutation,
    RemoteRecord, SuccessHook, UpdateRecord, UpdateSettings,
};
pub use time_tracking::TimerToggle;

/// What a query hands back to its caller.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub data: Option<CacheData>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_stale: bool,
    pub is_fetching: bool,
    pub error: Option<String>,
}

/// A fetch that has read the store but not yet written the cache.
pub struct PendingFetch {
    ticket: FetchTicket,
    result: Result<CacheData>,
}

impl PendingFetch {
    pub fn key(&self) -> &QueryKey {
        self.ticket.key()
    }
}

/// Read whatever `key` names from the store.
fn fetch<S: DataStore>(api: &FocusApi<S>, key: &QueryKey) -> Result<CacheData> {
    let user = key.user_id.as_str();
    let data = match &key.query {
        Query::Sessions(params) => CacheData::Sessions(api.list::<PomodoroSession>(user, params)?),
        Query::ActiveSession => CacheData::ActiveSession(api.active_session(user)?),
        Query::PomodoroSettings => CacheData::Settings(api.settings(user)?),
        Query::PomodoroStats => CacheData::PomodoroStats(api.pomodoro_stats(user)?),
        Query::GtdItems(params) => CacheData::GtdItems(api.list::<GtdItem>(user, params)?),
        Query::GtdItem { id } => CacheData::GtdItem(
            api.get::<GtdItem>(id)?
                .filter(|item| item.user_id == key.user_id),
        ),
        Query::GtdView { category, limit } => {
            let params = ListParams::new(GtdFilter::view(*category), *limit);
            CacheData::GtdItems(api.list::<GtdItem>(user, &params)?)
        }
        Query::GtdProjects(params) => CacheData::GtdProjects(api.list::<GtdProject>(user, params)?),
        Query::EnergyLevels(params) => {
            CacheData::EnergyLevels(api.list::<EnergyLevel>(user, params)?)
        }
        Query::EnergyInsights => CacheData::EnergyInsights(api.energy_insights(user)?),
        Query::TimeEntries(params) => CacheData::TimeEntries(api.list::<TimeEntry>(user, params)?),
        Query::TimeProjects(params) => {
            CacheData::TimeProjects(api.list::<TimeProject>(user, params)?)
        }
        Query::ActiveTimer => CacheData::ActiveTimer(api.active_timer(user)?),
        Query::TimeStats => CacheData::TimeStats(api.time_stats(user)?),
        Query::TwoMinuteTasks(params) => {
            CacheData::TwoMinuteTasks(api.list::<TwoMinuteTask>(user, params)?)
        }
        Query::TwoMinuteStats => CacheData::TwoMinuteStats(api.two_minute_stats(user)?),
        Query::TwoMinuteInsights => CacheData::TwoMinuteInsights(api.two_minute_insights(user)?),
    };
    Ok(data)
}

pub struct FocusClient<S: DataStore> {
    api: FocusApi<S>,
    cache: QueryCache,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    services: Services,
    last_placeholder: u64,
}

impl<S: DataStore> FocusClient<S> {
    pub fn new(api: FocusApi<S>, clock: Arc<dyn Clock>, config: CacheConfig, services: Services) -> Self {
        Self {
            api,
            cache: QueryCache::new(),
            clock,
            config,
            services,
            last_placeholder: 0,
        }
    }

    pub fn api(&self) -> &FocusApi<S> {
        &self.api
    }

    pub fn api_mut(&mut self) -> &mut FocusApi<S> {
        &mut self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn policy(&self, kind: QueryKind) -> QueryPolicy {
        QueryPolicy::for_kind(kind, &self.config)
    }

    /// List parameters for a first page of the configured size.
    pub fn first_page<F: Default>(&self) -> ListParams<F> {
        ListParams::new(F::default(), self.config.page_size)
    }

    pub fn query(&mut self, key: &QueryKey) -> QueryResult {
        let now = self.now();
        self.cache.touch(key, now);
        if self.needs_fetch(key, now) {
            self.refetch(key);
        }
        self.result(key)
    }

    /// Cached state of `key`, without fetching.
    pub fn peek(&self, key: &QueryKey) -> QueryResult {
        self.result(key)
    }

    pub fn start_fetch(&mut self, key: &QueryKey) -> PendingFetch {
        let ticket = self.cache.begin_fetch(key);
        let result = fetch(&self.api, key);
        PendingFetch { ticket, result }
    }

    /// Returns whether the result was stored.
    pub fn finish_fetch(&mut self, pending: PendingFetch) -> bool {
        let PendingFetch { ticket, result } = pending;
        if let Err(err) = &result {
            tracing::warn!(key = %ticket.key(), error = %err, "fetch failed, keeping cached data");
        }
        let now = self.now();
        self.cache.complete_fetch(ticket, result, now)
    }

    /// Mark matching keys stale and refetch the observed ones.
    pub fn invalidate(&mut self, matcher: &KeyMatcher) -> Vec<QueryKey> {
        let keys = self.cache.invalidate(matcher);
        for key in &keys {
            if self.cache.is_observed(key) && !self.cache.is_fetching(key) {
                self.refetch(key);
            }
        }
        keys
    }

    /// Poll observed keys whose interval has elapsed, then drop idle entries.
    /// Returns the keys that were refetched.
    pub fn tick(&mut self) -> Vec<QueryKey> {
        let now = self.now();
        let due: Vec<QueryKey> = self
            .cache
            .observed_keys()
            .into_iter()
            .filter(|key| !self.cache.is_fetching(key))
            .filter(|key| {
                let Some(interval) = self.policy(key.kind()).refetch_interval else {
                    return false;
                };
                self.cache
                    .get(key)
                    .and_then(|entry| entry.fetched_at.or(entry.data_updated_at))
                    .map_or(true, |at| now - at >= interval)
            })
            .collect();
        for key in &due {
            self.refetch(key);
        }
        self.cache.gc(now, secs(self.config.gc_secs));
        due
    }

    /// Refetch observed keys that are stale and opt in to focus refetching.
    pub fn on_window_focus(&mut self) -> Vec<QueryKey> {
        let now = self.now();
        let due: Vec<QueryKey> = self
            .cache
            .observed_keys()
            .into_iter()
            .filter(|key| self.policy(key.kind()).refetch_on_focus)
            .filter(|key| self.needs_fetch(key, now))
            .collect();
        for key in &due {
            self.refetch(key);
        }
        due
    }

    pub fn subscribe(&mut self, key: &QueryKey) -> SubscriptionId {
        let now = self.now();
        self.cache.subscribe(key, now)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let now = self.now();
        self.cache.unsubscribe(id, now)
    }

    pub fn take_events(&mut self, id: SubscriptionId) -> Vec<CacheEvent> {
        self.cache.take_events(id)
    }

    pub fn mutate<M: Mutation>(&mut self, mutation: M) -> MutationResult<M::Output> {
        let pending = self.begin(mutation);
        self.settle(pending)
    }

    /// Cancel, snapshot and apply `mutation` optimistically.
    pub fn begin<M: Mutation>(&mut self, mut mutation: M) -> PendingMutation<M> {
        let scope = mutation.scope();
        for matcher in &scope {
            self.cache.cancel(matcher);
        }
        let snapshot = self.cache.snapshot(&scope);
        let ctx = OptimisticContext {
            now: self.now(),
            placeholder: self.next_placeholder(),
        };
        mutation.apply_optimistic(&mut self.cache, &ctx);
        PendingMutation { mutation, snapshot }
    }

    /// Run the write, then reconcile or roll back.
    pub fn settle<M: Mutation>(&mut self, pending: PendingMutation<M>) -> MutationResult<M::Output> {
        let PendingMutation { mutation, snapshot } = pending;
        match mutation.execute(&mut self.api) {
            Err(err) => {
                self.cache.restore(snapshot);
                let label = mutation.label();
                tracing::warn!(mutation = %label, error = %err, "mutation failed, rolled back");
                self.services
                    .notifier
                    .notify(MessageLevel::Error, &format!("Failed to {label}"));
                MutationResult::RolledBack
            }
            Ok(output) => {
                let now = self.now();
                mutation.reconcile(&mut self.cache, &output, now);
                for matcher in mutation.invalidates() {
                    self.invalidate(&matcher);
                }
                if let Err(err) = mutation.on_success(&output, &self.services) {
                    tracing::warn!(mutation = %mutation.label(), error = %err, "side effect failed");
                    self.services
                        .notifier
                        .notify(MessageLevel::Warning, &err.to_string());
                }
                MutationResult::Committed(output)
            }
        }
    }

    /// `temp-<millis>`, bumped past the previous one when the clock has not moved.
    fn next_placeholder(&mut self) -> RecordId {
        let millis = u64::try_from(self.now().timestamp_millis()).unwrap_or(0);
        self.last_placeholder = millis.max(self.last_placeholder + 1);
        RecordId::Temp(self.last_placeholder)
    }

    fn needs_fetch(&self, key: &QueryKey, now: DateTime<Utc>) -> bool {
        if self.cache.is_fetching(key) {
            return false;
        }
        let stale_after = self.policy(key.kind()).stale_after;
        self.cache
            .get(key)
            .map_or(true, |entry| entry.is_stale(now, stale_after))
    }

    fn refetch(&mut self, key: &QueryKey) -> bool {
        let pending = self.start_fetch(key);
        self.finish_fetch(pending)
    }

    fn result(&self, key: &QueryKey) -> QueryResult {
        let now = self.now();
        let stale_after = self.policy(key.kind()).stale_after;
        let entry = self.cache.get(key).cloned().unwrap_or_else(CacheEntry::default);
        QueryResult {
            is_stale: entry.is_stale(now, stale_after),
            is_fetching: self.cache.is_fetching(key),
            updated_at: entry.data_updated_at,
            data: entry.data,
            error: entry.error,
        }
    }
}
