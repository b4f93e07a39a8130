use crate::model::{ListParams, Page, Record, RecordId};
use std::cmp::Ordering;
use std::collections::HashMap;

/// One entity type's records, keyed by id.
#[derive(Debug, Clone)]
pub struct Collection<T: Record> {
    records: HashMap<RecordId, T>,
}

impl<T: Record> Default for Collection<T> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
        }
    }
}

/// Newest first on the sort field, then newest created, then id.
pub fn newest_first<T: Record>(a: &T, b: &T) -> Ordering {
    b.sort_key()
        .cmp(&a.sort_key())
        .then_with(|| b.created_at().cmp(&a.created_at()))
        .then_with(|| a.id().cmp(b.id()))
}

impl<T: Record> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &RecordId) -> Option<&T> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &RecordId) -> Option<&mut T> {
        self.records.get_mut(id)
    }

    pub fn insert(&mut self, record: T) {
        self.records.insert(record.id().clone(), record);
    }

    pub fn remove(&mut self, id: &RecordId) -> Option<T> {
        self.records.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.records.values()
    }

    pub fn for_user<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a T> + 'a {
        self.records.values().filter(move |r| r.user_id() == user_id)
    }

    /// Window of the user's matching records, starting just after `params.cursor`.
    ///
    /// A cursor that is not in the sorted set restarts from the first record.
    pub fn page(&self, user_id: &str, params: &ListParams<T::Filter>) -> Page<T> {
        let mut matching: Vec<&T> = self
            .for_user(user_id)
            .filter(|r| r.matches(&params.filter))
            .collect();
        matching.sort_by(|a, b| newest_first(*a, *b));

        let start = params
            .cursor
            .as_ref()
            .and_then(|cursor| matching.iter().position(|r| r.id() == cursor))
            .map_or(0, |index| index + 1);
        let end = start.saturating_add(params.limit.max(1)).min(matching.len());

        let items: Vec<T> = matching[start..end].iter().map(|r| (*r).clone()).collect();
        let has_next = end < matching.len();
        let next_cursor = if has_next {
            items.last().map(|r| r.id().clone())
        } else {
            None
        };

        Page {
            items,
            total: matching.len(),
            has_next,
            next_cursor,
        }
    }
}
