use crate::model::{
    EnergyFilter, GtdCategory, GtdFilter, GtdProjectFilter, ListParams, RecordId, SessionFilter,
    TimeEntryFilter, TimeProjectFilter, TwoMinuteFilter,
};
use std::fmt;

/// Feature area a query belongs to. Mutations snapshot and invalidate by namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Pomodoro,
    Gtd,
    Energy,
    TimeTracking,
    TwoMinute,
}

/// A query shape without its parameters. Drives freshness policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKind {
    Sessions,
    ActiveSession,
    PomodoroSettings,
    PomodoroStats,
    GtdItems,
    GtdItem,
    GtdView,
    GtdProjects,
    EnergyLevels,
    EnergyInsights,
    TimeEntries,
    TimeProjects,
    ActiveTimer,
    TimeStats,
    TwoMinuteTasks,
    TwoMinuteStats,
    TwoMinuteInsights,
}

impl QueryKind {
    pub fn namespace(self) -> Namespace {
        match self {
            QueryKind::Sessions
            | QueryKind::ActiveSession
            | QueryKind::PomodoroSettings
            | QueryKind::PomodoroStats => Namespace::Pomodoro,
            QueryKind::GtdItems
            | QueryKind::GtdItem
            | QueryKind::GtdView
            | QueryKind::GtdProjects => Namespace::Gtd,
            QueryKind::EnergyLevels | QueryKind::EnergyInsights => Namespace::Energy,
            QueryKind::TimeEntries
            | QueryKind::TimeProjects
            | QueryKind::ActiveTimer
            | QueryKind::TimeStats => Namespace::TimeTracking,
            QueryKind::TwoMinuteTasks | QueryKind::TwoMinuteStats | QueryKind::TwoMinuteInsights => {
                Namespace::TwoMinute
            }
        }
    }

    pub fn is_list(self) -> bool {
        matches!(
            self,
            QueryKind::Sessions
                | QueryKind::GtdItems
                | QueryKind::GtdView
                | QueryKind::GtdProjects
                | QueryKind::EnergyLevels
                | QueryKind::TimeEntries
                | QueryKind::TimeProjects
                | QueryKind::TwoMinuteTasks
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    Sessions(ListParams<SessionFilter>),
    /// Polled while a timer is on screen.
    ActiveSession,
    PomodoroSettings,
    PomodoroStats,
    GtdItems(ListParams<GtdFilter>),
    /// One item by id, for detail screens.
    GtdItem { id: RecordId },
    /// Open items of one category: inbox, next actions, waiting for, someday/maybe.
    GtdView {
        category: GtdCategory,
        limit: usize,
    },
    GtdProjects(ListParams<GtdProjectFilter>),
    EnergyLevels(ListParams<EnergyFilter>),
    EnergyInsights,
    TimeEntries(ListParams<TimeEntryFilter>),
    TimeProjects(ListParams<TimeProjectFilter>),
    /// Polled while a timer is on screen.
    ActiveTimer,
    TimeStats,
    TwoMinuteTasks(ListParams<TwoMinuteFilter>),
    TwoMinuteStats,
    TwoMinuteInsights,
}

impl Query {
    pub fn kind(&self) -> QueryKind {
        match self {
            Query::Sessions(_) => QueryKind::Sessions,
            Query::ActiveSession => QueryKind::ActiveSession,
            Query::PomodoroSettings => QueryKind::PomodoroSettings,
            Query::PomodoroStats => QueryKind::PomodoroStats,
            Query::GtdItems(_) => QueryKind::GtdItems,
            Query::GtdItem { .. } => QueryKind::GtdItem,
            Query::GtdView { .. } => QueryKind::GtdView,
            Query::GtdProjects(_) => QueryKind::GtdProjects,
            Query::EnergyLevels(_) => QueryKind::EnergyLevels,
            Query::EnergyInsights => QueryKind::EnergyInsights,
            Query::TimeEntries(_) => QueryKind::TimeEntries,
            Query::TimeProjects(_) => QueryKind::TimeProjects,
            Query::ActiveTimer => QueryKind::ActiveTimer,
            Query::TimeStats => QueryKind::TimeStats,
            Query::TwoMinuteTasks(_) => QueryKind::TwoMinuteTasks,
            Query::TwoMinuteStats => QueryKind::TwoMinuteStats,
            Query::TwoMinuteInsights => QueryKind::TwoMinuteInsights,
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.kind().namespace()
    }
}

/// Identity of one cached value: who asked, and what.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub user_id: String,
    pub query: Query,
}

impl QueryKey {
    pub fn new(user_id: impl Into<String>, query: Query) -> Self {
        Self {
            user_id: user_id.into(),
            query,
        }
    }

    pub fn kind(&self) -> QueryKind {
        self.query.kind()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:?}", self.user_id, self.query)
    }
}

/// Selects cache keys. Always scoped to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMatcher {
    Namespace {
        user_id: String,
        namespace: Namespace,
    },
    Kind {
        user_id: String,
        kind: QueryKind,
    },
    Exact(QueryKey),
}

impl KeyMatcher {
    pub fn namespace(user_id: impl Into<String>, namespace: Namespace) -> Self {
        Self::Namespace {
            user_id: user_id.into(),
            namespace,
        }
    }

    pub fn kind(user_id: impl Into<String>, kind: QueryKind) -> Self {
        Self::Kind {
            user_id: user_id.into(),
            kind,
        }
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            KeyMatcher::Namespace { user_id, namespace } => {
                key.user_id == *user_id && key.query.namespace() == *namespace
            }
            KeyMatcher::Kind { user_id, kind } => key.user_id == *user_id && key.kind() == *kind,
            KeyMatcher::Exact(exact) => exact == key,
        }
    }
}
