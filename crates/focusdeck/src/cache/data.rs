use super::keys::{KeyMatcher, Namespace, Query, QueryKind};
use crate::insights::{EnergyInsights, TwoMinuteInsights};
use crate::model::{
    EnergyLevel, GtdFilter, GtdItem, GtdProject, ListParams, Page, PomodoroSession,
    PomodoroSettings, PomodoroStats, Record, RecordId, SessionType, TimeEntry, TimeProject,
    TimeStats, TwoMinuteStats, TwoMinuteTask,
};
use serde::Serialize;

/// A cached query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum CacheData {
    Sessions(Page<PomodoroSession>),
    ActiveSession(Option<PomodoroSession>),
    Settings(PomodoroSettings),
    PomodoroStats(PomodoroStats),
    GtdItems(Page<GtdItem>),
    GtdItem(Option<GtdItem>),
    GtdProjects(Page<GtdProject>),
    EnergyLevels(Page<EnergyLevel>),
    EnergyInsights(EnergyInsights),
    TimeEntries(Page<TimeEntry>),
    TimeProjects(Page<TimeProject>),
    ActiveTimer(Option<TimeEntry>),
    TimeStats(TimeStats),
    TwoMinuteTasks(Page<TwoMinuteTask>),
    TwoMinuteStats(TwoMinuteStats),
    TwoMinuteInsights(TwoMinuteInsights),
}

/// What an optimistic write or its reconciliation did to one record.
#[derive(Debug)]
pub enum Change<'a, T> {
    Created(&'a T),
    Updated { before: &'a T, after: &'a T },
    Deleted(&'a T),
    /// The store accepted a create; `placeholder` is the temporary id it replaces.
    Confirmed {
        placeholder: &'a RecordId,
        record: &'a T,
    },
}

/// A record type that lives in cached lists.
pub trait CachedRecord: Record {
    const NAMESPACE: Namespace;

    fn draft_user(draft: &Self::Draft) -> &str;

    /// List parameters of `query`, when it is a list of this type.
    fn list_params(query: &Query) -> Option<ListParams<Self::Filter>>;

    fn page(data: &CacheData) -> Option<&Page<Self>>;

    fn page_mut(data: &mut CacheData) -> Option<&mut Page<Self>>;

    /// Look for `id` anywhere `data` may hold this type.
    fn find_in<'a>(data: &'a CacheData, id: &RecordId) -> Option<&'a Self> {
        Self::page(data).and_then(|page| page.find(id))
    }

    /// Adjust non-list values (counts, the active record) for `change`.
    /// Returns whether `data` changed.
    fn apply_derived(_data: &mut CacheData, _change: &Change<'_, Self>) -> bool {
        false
    }

    /// Keys to invalidate after a successful write.
    fn invalidation(user_id: &str) -> Vec<KeyMatcher> {
        vec![KeyMatcher::namespace(user_id, Self::NAMESPACE)]
    }
}

macro_rules! cached {
    ($ty:ty, $ns:ident, $query:ident, $data:ident { $($body:tt)* }) => {
        impl CachedRecord for $ty {
            const NAMESPACE: Namespace = Namespace::$ns;

            fn draft_user(draft: &Self::Draft) -> &str {
                &draft.user_id
            }

            fn list_params(query: &Query) -> Option<ListParams<Self::Filter>> {
                match query {
                    Query::$query(params) => Some(params.clone()),
                    _ => None,
                }
            }

            fn page(data: &CacheData) -> Option<&Page<Self>> {
                match data {
                    CacheData::$data(page) => Some(page),
                    _ => None,
                }
            }

            fn page_mut(data: &mut CacheData) -> Option<&mut Page<Self>> {
                match data {
                    CacheData::$data(page) => Some(page),
                    _ => None,
                }
            }

            $($body)*
        }
    };
}

cached!(GtdProject, Gtd, GtdProjects, GtdProjects {});
cached!(EnergyLevel, Energy, EnergyLevels, EnergyLevels {});
cached!(TimeProject, TimeTracking, TimeProjects, TimeProjects {});

cached!(PomodoroSession, Pomodoro, Sessions, Sessions {
    fn find_in<'a>(data: &'a CacheData, id: &RecordId) -> Option<&'a Self> {
        match data {
            CacheData::Sessions(page) => page.find(id),
            CacheData::ActiveSession(active) => active.as_ref().filter(|s| &s.id == id),
            _ => None,
        }
    }

    fn apply_derived(data: &mut CacheData, change: &Change<'_, Self>) -> bool {
        match data {
            CacheData::ActiveSession(active) => follow_active(active, change, PomodoroSession::is_active),
            CacheData::PomodoroStats(stats) => adjust_pomodoro_stats(stats, change),
            _ => false,
        }
    }
});

cached!(TimeEntry, TimeTracking, TimeEntries, TimeEntries {
    fn find_in<'a>(data: &'a CacheData, id: &RecordId) -> Option<&'a Self> {
        match data {
            CacheData::TimeEntries(page) => page.find(id),
            CacheData::ActiveTimer(active) => active.as_ref().filter(|e| &e.id == id),
            _ => None,
        }
    }

    fn apply_derived(data: &mut CacheData, change: &Change<'_, Self>) -> bool {
        match data {
            CacheData::ActiveTimer(active) => follow_active(active, change, |e: &TimeEntry| e.is_running),
            CacheData::TimeStats(stats) => match change {
                Change::Created(_) => {
                    stats.entry_count += 1;
                    true
                }
                Change::Deleted(_) => {
                    stats.entry_count = stats.entry_count.saturating_sub(1);
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }
});

cached!(TwoMinuteTask, TwoMinute, TwoMinuteTasks, TwoMinuteTasks {
    fn apply_derived(data: &mut CacheData, change: &Change<'_, Self>) -> bool {
        match data {
            CacheData::TwoMinuteStats(stats) => adjust_two_minute_stats(stats, change),
            _ => false,
        }
    }
});

impl CachedRecord for GtdItem {
    const NAMESPACE: Namespace = Namespace::Gtd;

    fn draft_user(draft: &Self::Draft) -> &str {
        &draft.user_id
    }

    fn list_params(query: &Query) -> Option<ListParams<GtdFilter>> {
        match query {
            Query::GtdItems(params) => Some(params.clone()),
            Query::GtdView { category, limit } => {
                Some(ListParams::new(GtdFilter::view(*category), *limit))
            }
            _ => None,
        }
    }

    fn page(data: &CacheData) -> Option<&Page<Self>> {
        match data {
            CacheData::GtdItems(page) => Some(page),
            _ => None,
        }
    }

    fn page_mut(data: &mut CacheData) -> Option<&mut Page<Self>> {
        match data {
            CacheData::GtdItems(page) => Some(page),
            _ => None,
        }
    }

    fn find_in<'a>(data: &'a CacheData, id: &RecordId) -> Option<&'a Self> {
        match data {
            CacheData::GtdItems(page) => page.find(id),
            CacheData::GtdItem(item) => item.as_ref().filter(|i| &i.id == id),
            _ => None,
        }
    }

    fn apply_derived(data: &mut CacheData, change: &Change<'_, Self>) -> bool {
        match data {
            CacheData::GtdItem(item) => follow_detail(item, change),
            _ => false,
        }
    }

    /// Every item list, every context view and the projects, whatever moved.
    fn invalidation(user_id: &str) -> Vec<KeyMatcher> {
        vec![
            KeyMatcher::kind(user_id, QueryKind::GtdItems),
            KeyMatcher::kind(user_id, QueryKind::GtdItem),
            KeyMatcher::kind(user_id, QueryKind::GtdView),
            KeyMatcher::kind(user_id, QueryKind::GtdProjects),
        ]
    }
}

/// Keep a cached single record in step with `change`. A detail never gains a
/// record it did not already hold.
fn follow_detail<T: Record>(detail: &mut Option<T>, change: &Change<'_, T>) -> bool {
    let holds = |detail: &Option<T>, id: &RecordId| detail.as_ref().is_some_and(|d| d.id() == id);
    match change {
        Change::Updated { after, .. } if holds(detail, after.id()) => {
            *detail = Some((*after).clone());
            true
        }
        Change::Deleted(record) if holds(detail, record.id()) => {
            *detail = None;
            true
        }
        Change::Confirmed {
            placeholder,
            record,
        } if holds(detail, *placeholder) => {
            *detail = Some((*record).clone());
            true
        }
        _ => false,
    }
}

/// Keep a cached "the one active record" value in step with `change`.
fn follow_active<T, F>(active: &mut Option<T>, change: &Change<'_, T>, is_active: F) -> bool
where
    T: Record,
    F: Fn(&T) -> bool,
{
    let holds = |active: &Option<T>, id: &RecordId| active.as_ref().is_some_and(|a| a.id() == id);
    match change {
        Change::Created(record) if is_active(*record) => {
            *active = Some((*record).clone());
            true
        }
        Change::Updated { after, .. } if holds(active, after.id()) => {
            *active = is_active(*after).then(|| (*after).clone());
            true
        }
        Change::Updated { after, .. } if active.is_none() && is_active(*after) => {
            *active = Some((*after).clone());
            true
        }
        Change::Deleted(record) if holds(active, record.id()) => {
            *active = None;
            true
        }
        Change::Confirmed {
            placeholder,
            record,
        } if holds(active, *placeholder) => {
            *active = Some((*record).clone());
            true
        }
        _ => false,
    }
}

fn adjust_pomodoro_stats(stats: &mut PomodoroStats, change: &Change<'_, PomodoroSession>) -> bool {
    match change {
        Change::Created(_) => stats.total_sessions += 1,
        Change::Updated { before, after } => {
            if !before.completed && after.completed {
                stats.completed_sessions += 1;
                if after.session_type == SessionType::Work {
                    stats.total_focus_minutes += u64::from(after.duration_minutes);
                    stats.today_sessions += 1;
                }
            }
            if !before.interrupted && after.interrupted {
                stats.interrupted_sessions += 1;
            }
        }
        Change::Deleted(session) => {
            stats.total_sessions = stats.total_sessions.saturating_sub(1);
            if session.completed {
                stats.completed_sessions = stats.completed_sessions.saturating_sub(1);
            }
            if session.interrupted {
                stats.interrupted_sessions = stats.interrupted_sessions.saturating_sub(1);
            }
        }
        Change::Confirmed { .. } => return false,
    }
    stats.refresh_rate();
    true
}

fn adjust_two_minute_stats(stats: &mut TwoMinuteStats, change: &Change<'_, TwoMinuteTask>) -> bool {
    match change {
        Change::Created(task) => {
            stats.total_tasks += 1;
            if task.completed {
                stats.completed_tasks += 1;
            } else {
                stats.active_tasks += 1;
            }
        }
        Change::Updated { before, after } if before.completed != after.completed => {
            if after.completed {
                stats.completed_tasks += 1;
                stats.active_tasks = stats.active_tasks.saturating_sub(1);
                stats.today_completed += 1;
            } else {
                stats.completed_tasks = stats.completed_tasks.saturating_sub(1);
                stats.active_tasks += 1;
                stats.today_completed = stats.today_completed.saturating_sub(1);
            }
        }
        Change::Deleted(task) => {
            stats.total_tasks = stats.total_tasks.saturating_sub(1);
            if task.completed {
                stats.completed_tasks = stats.completed_tasks.saturating_sub(1);
            } else {
                stats.active_tasks = stats.active_tasks.saturating_sub(1);
            }
        }
        _ => return false,
    }
    stats.refresh_rate();
    true
}
