use super::keys::QueryKind;
use crate::config::CacheConfig;
use chrono::Duration;

/// Upper bound for configured intervals, so conversions never overflow.
const MAX_SECS: u64 = 60 * 60 * 24 * 365;

pub(crate) fn secs(value: u64) -> Duration {
    Duration::seconds(value.min(MAX_SECS) as i64)
}

/// How long a query's data stays fresh and when it refetches on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
    pub stale_after: Duration,
    pub refetch_interval: Option<Duration>,
    pub refetch_on_focus: bool,
}

impl QueryPolicy {
    pub fn for_kind(kind: QueryKind, config: &CacheConfig) -> Self {
        match kind {
            QueryKind::ActiveTimer | QueryKind::ActiveSession => Self {
                stale_after: Duration::zero(),
                refetch_interval: Some(secs(config.active_poll_secs)),
                refetch_on_focus: true,
            },
            QueryKind::PomodoroSettings => Self {
                stale_after: secs(config.settings_stale_secs),
                refetch_interval: None,
                refetch_on_focus: false,
            },
            QueryKind::PomodoroStats
            | QueryKind::TimeStats
            | QueryKind::TwoMinuteStats
            | QueryKind::EnergyInsights
            | QueryKind::TwoMinuteInsights => Self {
                stale_after: secs(config.stats_stale_secs),
                refetch_interval: None,
                refetch_on_focus: config.refetch_on_focus,
            },
            _ => Self {
                stale_after: secs(config.list_stale_secs),
                refetch_interval: None,
                refetch_on_focus: config.refetch_on_focus,
            },
        }
    }
}
