//! # Query Cache
//!
//! A keyed store of query results, modelled on a client-side server-state cache.
//! Each [`QueryKey`] maps to a [`CacheEntry`] holding the last data, when it was
//! written, the last fetch error and whether it has been invalidated.
//!
//! ## Fetch Generations
//!
//! A fetch is a two-step affair: [`QueryCache::begin_fetch`] hands out a
//! [`FetchTicket`], [`QueryCache::complete_fetch`] stores the result. Cancelling
//! a key (an optimistic mutation does this for its scope) forgets the ticket's
//! generation, so a result that lands afterwards is discarded instead of
//! overwriting the optimistic value.
//!
//! ## Snapshots
//!
//! [`QueryCache::snapshot`] copies every entry matching a set of
//! [`KeyMatcher`]s; [`QueryCache::restore`] puts the cache back exactly as it
//! was for those keys. [`QueryCache::dump`] renders the whole cache as stable
//! JSON so two states can be compared byte for byte.
//!
//! ## Observers
//!
//! Subscribing to a key marks it observed: observed keys are polled and
//! refetched on focus and invalidation, and are never garbage collected. Each
//! subscription collects [`CacheEvent`]s until drained with
//! [`QueryCache::take_events`].

use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub mod data;
pub mod keys;
pub mod optimistic;
pub mod policy;

pub use data::{CacheData, CachedRecord, Change};
pub use keys::{KeyMatcher, Namespace, Query, QueryKey, QueryKind};
pub use policy::QueryPolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub data: Option<CacheData>,
    pub data_updated_at: Option<DateTime<Utc>>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub invalidated: bool,
}

impl CacheEntry {
    /// No data, invalidated, or older than `stale_after`.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        match (&self.data, self.data_updated_at) {
            (Some(_), Some(updated)) => self.invalidated || now - updated >= stale_after,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Updated(QueryKey),
    Invalidated(QueryKey),
    Removed(QueryKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    key: QueryKey,
    generation: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

/// Entries captured by [`QueryCache::snapshot`].
#[derive(Debug, Clone)]
pub struct Snapshot {
    matchers: Vec<KeyMatcher>,
    entries: Vec<(QueryKey, CacheEntry)>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug)]
struct Subscriber {
    key: QueryKey,
    inbox: Vec<CacheEvent>,
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    last_used: HashMap<QueryKey, DateTime<Utc>>,
    in_flight: HashMap<QueryKey, u64>,
    next_generation: u64,
    subscribers: BTreeMap<SubscriptionId, Subscriber>,
    next_subscription: u64,
}

fn matches_any(matchers: &[KeyMatcher], key: &QueryKey) -> bool {
    matchers.iter().any(|m| m.matches(key))
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &QueryKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn data(&self, key: &QueryKey) -> Option<&CacheData> {
        self.entries.get(key).and_then(|entry| entry.data.as_ref())
    }

    pub fn set_data(&mut self, key: &QueryKey, data: CacheData, now: DateTime<Utc>) {
        let entry = self.entries.entry(key.clone()).or_default();
        entry.data = Some(data);
        entry.data_updated_at = Some(now);
        entry.error = None;
        entry.invalidated = false;
        self.notify(key, CacheEvent::Updated);
    }

    pub fn set_error(&mut self, key: &QueryKey, message: impl Into<String>) {
        self.entries.entry(key.clone()).or_default().error = Some(message.into());
        self.notify(key, CacheEvent::Updated);
    }

    /// Run `f` over the data of every matching entry. `f` returns whether it
    /// changed anything. Returns the keys that changed.
    pub fn update_where<F>(&mut self, matcher: &KeyMatcher, mut f: F) -> Vec<QueryKey>
    where
        F: FnMut(&QueryKey, &mut CacheData) -> bool,
    {
        let mut changed = Vec::new();
        for (key, entry) in self.entries.iter_mut() {
            if !matcher.matches(key) {
                continue;
            }
            if let Some(data) = entry.data.as_mut() {
                if f(key, data) {
                    changed.push(key.clone());
                }
            }
        }
        for key in &changed {
            self.notify(key, CacheEvent::Updated);
        }
        changed
    }

    pub fn keys_matching(&self, matcher: &KeyMatcher) -> Vec<QueryKey> {
        self.entries
            .keys()
            .filter(|key| matcher.matches(key))
            .cloned()
            .collect()
    }

    pub fn begin_fetch(&mut self, key: &QueryKey) -> FetchTicket {
        self.next_generation += 1;
        self.in_flight.insert(key.clone(), self.next_generation);
        FetchTicket {
            key: key.clone(),
            generation: self.next_generation,
        }
    }

    /// Store a fetch result. Returns false when the ticket was cancelled or
    /// superseded; the result is then dropped.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<CacheData>,
        now: DateTime<Utc>,
    ) -> bool {
        if self.in_flight.get(&ticket.key) != Some(&ticket.generation) {
            tracing::debug!(key = %ticket.key, "discarding superseded fetch");
            return false;
        }
        self.in_flight.remove(&ticket.key);
        let entry = self.entries.entry(ticket.key.clone()).or_default();
        entry.fetched_at = Some(now);
        match result {
            Ok(data) => {
                entry.data = Some(data);
                entry.data_updated_at = Some(now);
                entry.error = None;
                entry.invalidated = false;
            }
            Err(err) => entry.error = Some(err.to_string()),
        }
        self.notify(&ticket.key, CacheEvent::Updated);
        true
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.in_flight.contains_key(key)
    }

    /// Forget in-flight fetches of matching keys. Returns how many were cancelled.
    pub fn cancel(&mut self, matcher: &KeyMatcher) -> usize {
        let before = self.in_flight.len();
        self.in_flight.retain(|key, _| !matcher.matches(key));
        before - self.in_flight.len()
    }

    pub fn snapshot(&self, matchers: &[KeyMatcher]) -> Snapshot {
        let entries = self
            .entries
            .iter()
            .filter(|(key, _)| matches_any(matchers, key))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();
        Snapshot {
            matchers: matchers.to_vec(),
            entries,
        }
    }

    /// Put matching entries back as they were when `snapshot` was taken.
    /// Entries created since then under the same matchers are dropped.
    pub fn restore(&mut self, snapshot: Snapshot) {
        let Snapshot { matchers, entries } = snapshot;
        let added: Vec<QueryKey> = self
            .entries
            .keys()
            .filter(|key| matches_any(&matchers, key))
            .filter(|key| !entries.iter().any(|(saved, _)| saved == *key))
            .cloned()
            .collect();
        for key in added {
            self.entries.remove(&key);
            self.notify(&key, CacheEvent::Removed);
        }
        for (key, entry) in entries {
            self.entries.insert(key.clone(), entry);
            self.notify(&key, CacheEvent::Updated);
        }
    }

    /// Mark matching entries stale. Returns the keys marked.
    pub fn invalidate(&mut self, matcher: &KeyMatcher) -> Vec<QueryKey> {
        let keys = self.keys_matching(matcher);
        for key in &keys {
            if let Some(entry) = self.entries.get_mut(key) {
                entry.invalidated = true;
            }
            self.notify(key, CacheEvent::Invalidated);
        }
        keys
    }

    pub fn remove(&mut self, key: &QueryKey) -> Option<CacheEntry> {
        self.in_flight.remove(key);
        self.last_used.remove(key);
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.notify(key, CacheEvent::Removed);
        }
        removed
    }

    /// Drop unobserved, idle entries last used more than `gc_after` ago.
    pub fn gc(&mut self, now: DateTime<Utc>, gc_after: Duration) -> Vec<QueryKey> {
        let expired: Vec<QueryKey> = self
            .entries
            .iter()
            .filter(|(key, _)| !self.is_observed(key) && !self.is_fetching(key))
            .filter(|(key, entry)| {
                let used = self
                    .last_used
                    .get(*key)
                    .copied()
                    .or(entry.data_updated_at)
                    .or(entry.fetched_at);
                used.map_or(true, |at| now - at >= gc_after)
            })
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.remove(key);
        }
        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "collected idle cache entries");
        }
        expired
    }

    pub fn touch(&mut self, key: &QueryKey, now: DateTime<Utc>) {
        self.last_used.insert(key.clone(), now);
    }

    pub fn subscribe(&mut self, key: &QueryKey, now: DateTime<Utc>) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscribers.insert(
            id,
            Subscriber {
                key: key.clone(),
                inbox: Vec::new(),
            },
        );
        self.touch(key, now);
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId, now: DateTime<Utc>) -> bool {
        match self.subscribers.remove(&id) {
            Some(subscriber) => {
                self.touch(&subscriber.key, now);
                true
            }
            None => false,
        }
    }

    pub fn take_events(&mut self, id: SubscriptionId) -> Vec<CacheEvent> {
        self.subscribers
            .get_mut(&id)
            .map(|s| std::mem::take(&mut s.inbox))
            .unwrap_or_default()
    }

    pub fn is_observed(&self, key: &QueryKey) -> bool {
        self.subscribers.values().any(|s| &s.key == key)
    }

    /// Observed keys, each once, in subscription order.
    pub fn observed_keys(&self) -> Vec<QueryKey> {
        let mut keys: Vec<QueryKey> = Vec::new();
        for subscriber in self.subscribers.values() {
            if !keys.contains(&subscriber.key) {
                keys.push(subscriber.key.clone());
            }
        }
        keys
    }

    /// Every entry as pretty JSON, ordered by key.
    pub fn dump(&self) -> Result<String> {
        let ordered: BTreeMap<String, &CacheEntry> = self
            .entries
            .iter()
            .map(|(key, entry)| (key.to_string(), entry))
            .collect();
        Ok(serde_json::to_string_pretty(&ordered)?)
    }

    fn notify(&mut self, key: &QueryKey, event: fn(QueryKey) -> CacheEvent) {
        for subscriber in self.subscribers.values_mut() {
            if &subscriber.key == key {
                subscriber.inbox.push(event(key.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FocusError;
    use crate::model::{Page, TwoMinuteStats};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 10, 9, 0, 0).unwrap()
    }

    fn stats_key() -> QueryKey {
        QueryKey::new("u1", Query::TwoMinuteStats)
    }

    fn stats(total: usize) -> CacheData {
        CacheData::TwoMinuteStats(TwoMinuteStats {
            total_tasks: total,
            ..Default::default()
        })
    }

    #[test]
    fn cancelled_fetch_is_discarded() {
        let mut cache = QueryCache::new();
        cache.set_data(&stats_key(), stats(1), now());
        let ticket = cache.begin_fetch(&stats_key());
        assert!(cache.is_fetching(&stats_key()));

        assert_eq!(cache.cancel(&KeyMatcher::namespace("u1", Namespace::TwoMinute)), 1);
        assert!(!cache.complete_fetch(ticket, Ok(stats(9)), now()));
        assert_eq!(cache.data(&stats_key()), Some(&stats(1)));
    }

    #[test]
    fn newer_fetch_supersedes_older() {
        let mut cache = QueryCache::new();
        let first = cache.begin_fetch(&stats_key());
        let second = cache.begin_fetch(&stats_key());
        assert!(cache.complete_fetch(second, Ok(stats(2)), now()));
        assert!(!cache.complete_fetch(first, Ok(stats(1)), now()));
        assert_eq!(cache.data(&stats_key()), Some(&stats(2)));
    }

    #[test]
    fn failed_fetch_keeps_previous_data() {
        let mut cache = QueryCache::new();
        cache.set_data(&stats_key(), stats(3), now());
        let ticket = cache.begin_fetch(&stats_key());
        cache.complete_fetch(ticket, Err(FocusError::Store("offline".into())), now());
        let entry = cache.get(&stats_key()).unwrap();
        assert_eq!(entry.data, Some(stats(3)));
        assert_eq!(entry.error.as_deref(), Some("Store error: offline"));
    }

    #[test]
    fn restore_is_exact() {
        let mut cache = QueryCache::new();
        let list = QueryKey::new("u1", Query::TwoMinuteTasks(Default::default()));
        cache.set_data(&list, CacheData::TwoMinuteTasks(Page::default()), now());
        cache.set_data(&stats_key(), stats(1), now());
        let before = cache.dump().unwrap();

        let scope = [KeyMatcher::namespace("u1", Namespace::TwoMinute)];
        let snapshot = cache.snapshot(&scope);
        assert_eq!(snapshot.len(), 2);
        cache.update_where(&scope[0], |_, data| {
            *data = stats(5);
            true
        });
        cache.set_data(&QueryKey::new("u1", Query::TwoMinuteInsights), stats(0), now());
        cache.restore(snapshot);

        assert_eq!(cache.dump().unwrap(), before);
    }

    #[test]
    fn invalidation_marks_stale_and_notifies() {
        let mut cache = QueryCache::new();
        cache.set_data(&stats_key(), stats(1), now());
        let sub = cache.subscribe(&stats_key(), now());
        let marked = cache.invalidate(&KeyMatcher::kind("u1", QueryKind::TwoMinuteStats));
        assert_eq!(marked, vec![stats_key()]);
        let entry = cache.get(&stats_key()).unwrap();
        assert!(entry.is_stale(now(), Duration::seconds(60)));
        assert_eq!(cache.take_events(sub), vec![CacheEvent::Invalidated(stats_key())]);
        assert!(cache.take_events(sub).is_empty());
    }

    #[test]
    fn gc_spares_observed_entries() {
        let mut cache = QueryCache::new();
        let watched = QueryKey::new("u1", Query::TimeStats);
        cache.set_data(&stats_key(), stats(1), now());
        cache.set_data(&watched, CacheData::TimeStats(Default::default()), now());
        let sub = cache.subscribe(&watched, now());

        let later = now() + Duration::minutes(10);
        assert_eq!(cache.gc(later, Duration::minutes(5)), vec![stats_key()]);
        assert!(cache.get(&watched).is_some());

        cache.unsubscribe(sub, later);
        assert!(cache.gc(later + Duration::minutes(1), Duration::minutes(5)).is_empty());
        assert_eq!(cache.gc(later + Duration::minutes(5), Duration::minutes(5)), vec![watched]);
    }
}
