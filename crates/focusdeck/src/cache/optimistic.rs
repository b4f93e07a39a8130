//! Record-level edits applied across every cached query of one user.
//!
//! List entries are edited in place: inserts land at the head of first pages
//! whose filter accepts the record, updates replace (or drop, or add when the
//! record moves into a filter), deletes remove. Every other entry in the
//! record's namespace goes through [`CachedRecord::apply_derived`].

use super::data::{CachedRecord, Change};
use super::keys::{KeyMatcher, QueryKey};
use super::QueryCache;
use crate::model::RecordId;
use chrono::{DateTime, Utc};

fn scope<T: CachedRecord>(user_id: &str) -> KeyMatcher {
    KeyMatcher::namespace(user_id, T::NAMESPACE)
}

/// The first cached copy of `id`.
pub fn find_record<T: CachedRecord>(cache: &QueryCache, user_id: &str, id: &RecordId) -> Option<T> {
    cache
        .keys_matching(&scope::<T>(user_id))
        .iter()
        .filter_map(|key| cache.data(key))
        .find_map(|data| T::find_in(data, id))
        .cloned()
}

pub fn insert_record<T: CachedRecord>(cache: &mut QueryCache, user_id: &str, record: &T) -> Vec<QueryKey> {
    cache.update_where(&scope::<T>(user_id), |key, data| match T::list_params(&key.query) {
        Some(params) => {
            if !params.is_first_page() || !record.matches(&params.filter) {
                return false;
            }
            match T::page_mut(data) {
                Some(page) if !page.contains(record.id()) => {
                    page.insert_head(record.clone(), params.limit);
                    true
                }
                _ => false,
            }
        }
        None => T::apply_derived(data, &Change::Created(record)),
    })
}

/// Move every cached copy of `before` to `after`.
pub fn apply_update<T: CachedRecord>(
    cache: &mut QueryCache,
    user_id: &str,
    before: &T,
    after: &T,
) -> Vec<QueryKey> {
    let id = after.id();
    cache.update_where(&scope::<T>(user_id), |key, data| match T::list_params(&key.query) {
        Some(params) => {
            let Some(page) = T::page_mut(data) else {
                return false;
            };
            let accepts = after.matches(&params.filter);
            if page.contains(id) {
                if accepts {
                    page.replace(id, after)
                } else {
                    page.remove(id)
                }
            } else if accepts && params.is_first_page() && !before.matches(&params.filter) {
                page.insert_head(after.clone(), params.limit);
                true
            } else {
                false
            }
        }
        None => T::apply_derived(data, &Change::Updated { before, after }),
    })
}

/// Patch the cached copy of `id`. Returns the patched record, or `None` when
/// nothing cached holds it.
pub fn patch_record<T: CachedRecord>(
    cache: &mut QueryCache,
    user_id: &str,
    id: &RecordId,
    patch: T::Patch,
    now: DateTime<Utc>,
) -> Option<T> {
    let before: T = find_record(cache, user_id, id)?;
    let mut after = before.clone();
    after.apply_patch(patch, now);
    apply_update(cache, user_id, &before, &after);
    Some(after)
}

/// Replace the cached copy of `record` with the store's version.
pub fn replace_record<T: CachedRecord>(cache: &mut QueryCache, user_id: &str, record: &T) -> bool {
    match find_record::<T>(cache, user_id, record.id()) {
        Some(before) => !apply_update(cache, user_id, &before, record).is_empty(),
        None => false,
    }
}

/// Drop `id` from every cached query. Returns the record that was removed.
pub fn remove_record<T: CachedRecord>(cache: &mut QueryCache, user_id: &str, id: &RecordId) -> Option<T> {
    let record: T = find_record(cache, user_id, id)?;
    cache.update_where(&scope::<T>(user_id), |key, data| match T::list_params(&key.query) {
        Some(_) => T::page_mut(data).is_some_and(|page| page.remove(id)),
        None => T::apply_derived(data, &Change::Deleted(&record)),
    });
    Some(record)
}

/// Swap the optimistic `placeholder` for the stored record.
pub fn confirm_record<T: CachedRecord>(
    cache: &mut QueryCache,
    user_id: &str,
    placeholder: &RecordId,
    record: &T,
) -> Vec<QueryKey> {
    cache.update_where(&scope::<T>(user_id), |key, data| match T::list_params(&key.query) {
        Some(_) => T::page_mut(data).is_some_and(|page| page.replace(placeholder, record)),
        None => T::apply_derived(
            data,
            &Change::Confirmed {
                placeholder,
                record,
            },
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheData, Query};
    use crate::model::{
        GtdCategory, GtdItem, GtdItemDraft, GtdItemPatch, ListParams, Page, Record,
        TaskStatusFilter, TwoMinuteFilter, TwoMinuteStats, TwoMinuteTask, TwoMinuteTaskDraft,
        TwoMinuteTaskPatch,
    };
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 10, 9, 0, 0).unwrap()
    }

    fn tasks_key(status: TaskStatusFilter) -> QueryKey {
        QueryKey::new(
            "u1",
            Query::TwoMinuteTasks(ListParams::new(TwoMinuteFilter::with_status(status), 20)),
        )
    }

    fn primed() -> QueryCache {
        let mut cache = QueryCache::new();
        for status in [TaskStatusFilter::Active, TaskStatusFilter::Completed] {
            cache.set_data(&tasks_key(status), CacheData::TwoMinuteTasks(Page::default()), now());
        }
        cache.set_data(
            &QueryKey::new("u1", Query::TwoMinuteStats),
            CacheData::TwoMinuteStats(TwoMinuteStats::default()),
            now(),
        );
        cache
    }

    fn page(cache: &QueryCache, status: TaskStatusFilter) -> &Page<TwoMinuteTask> {
        match cache.data(&tasks_key(status)) {
            Some(CacheData::TwoMinuteTasks(page)) => page,
            other => panic!("unexpected {other:?}"),
        }
    }

    fn placeholder_task() -> TwoMinuteTask {
        TwoMinuteTask::from_draft(
            RecordId::Temp(1),
            TwoMinuteTaskDraft::new("u1", "File report", 2),
            now(),
        )
    }

    #[test]
    fn insert_goes_only_where_the_filter_accepts() {
        let mut cache = primed();
        let changed = insert_record(&mut cache, "u1", &placeholder_task());
        assert_eq!(changed.len(), 2);
        assert_eq!(page(&cache, TaskStatusFilter::Active).total, 1);
        assert_eq!(page(&cache, TaskStatusFilter::Completed).total, 0);
    }

    #[test]
    fn completing_moves_between_lists() {
        let mut cache = primed();
        insert_record(&mut cache, "u1", &placeholder_task());
        let done: TwoMinuteTask = patch_record(
            &mut cache,
            "u1",
            &RecordId::Temp(1),
            TwoMinuteTaskPatch::complete(Some(45)),
            now(),
        )
        .unwrap();
        assert!(done.completed);
        assert!(page(&cache, TaskStatusFilter::Active).items.is_empty());
        assert!(page(&cache, TaskStatusFilter::Completed).contains(&RecordId::Temp(1)));
    }

    #[test]
    fn confirm_swaps_placeholder_ids() {
        let mut cache = primed();
        let optimistic = placeholder_task();
        insert_record(&mut cache, "u1", &optimistic);
        let mut stored = optimistic.clone();
        stored.id = RecordId::generate();
        confirm_record(&mut cache, "u1", &RecordId::Temp(1), &stored);

        let active = page(&cache, TaskStatusFilter::Active);
        assert_eq!(active.items, vec![stored.clone()]);
        assert_eq!(active.total, 1);
    }

    #[test]
    fn remove_reverts_counts() {
        let mut cache = primed();
        insert_record(&mut cache, "u1", &placeholder_task());
        let removed: Option<TwoMinuteTask> = remove_record(&mut cache, "u1", &RecordId::Temp(1));
        assert!(removed.is_some());
        assert_eq!(page(&cache, TaskStatusFilter::Active).total, 0);
        let Some(CacheData::TwoMinuteStats(stats)) =
            cache.data(&QueryKey::new("u1", Query::TwoMinuteStats))
        else {
            panic!("stats missing");
        };
        assert_eq!(stats.total_tasks, 0);
        assert!(remove_record::<TwoMinuteTask>(&mut cache, "u1", &RecordId::Temp(1)).is_none());
    }

    #[test]
    fn recategorised_item_joins_its_new_view() {
        let mut cache = QueryCache::new();
        let view = |category| QueryKey::new("u1", Query::GtdView { category, limit: 20 });
        let item = GtdItem::from_draft(RecordId::generate(), GtdItemDraft::capture("u1", "Plan trip"), now());
        let mut inbox = Page::default();
        inbox.insert_head(item.clone(), 20);
        cache.set_data(&view(GtdCategory::Inbox), CacheData::GtdItems(inbox), now());
        cache.set_data(&view(GtdCategory::NextAction), CacheData::GtdItems(Page::default()), now());

        patch_record::<GtdItem>(
            &mut cache,
            "u1",
            &item.id,
            GtdItemPatch {
                category: Some(GtdCategory::NextAction),
                ..Default::default()
            },
            now(),
        );
        let len = |category| match cache.data(&view(category)) {
            Some(CacheData::GtdItems(page)) => page.items.len(),
            _ => usize::MAX,
        };
        assert_eq!(len(GtdCategory::Inbox), 0);
        assert_eq!(len(GtdCategory::NextAction), 1);
    }
}
