use chrono::{DateTime, TimeZone, Utc};
use focusdeck::app::{initialize, FocusContext};
use focusdeck::cache::{CacheData, Query, QueryKey};
use focusdeck::clock::ManualClock;
use focusdeck::config::FocusConfig;
use focusdeck::model::{ListParams, Page, TaskStatusFilter, TwoMinuteFilter, TwoMinuteTask};
use focusdeck::prefs::MemKv;
use focusdeck::services::ServiceLog;
use std::sync::Arc;

pub const USER: &str = "u1";

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 10, 9, 0, 0).unwrap()
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub log: ServiceLog,
    pub ctx: FocusContext<MemKv>,
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(start()));
        let log = ServiceLog::new();
        let mut config = FocusConfig::default();
        config.seed.enabled = false;
        let ctx = initialize(config, clock.clone(), log.services(), MemKv::new());
        Self { clock, log, ctx }
    }

    pub fn active_tasks_key(&self) -> QueryKey {
        QueryKey::new(
            USER,
            Query::TwoMinuteTasks(ListParams::new(
                TwoMinuteFilter::with_status(TaskStatusFilter::Active),
                20,
            )),
        )
    }

    /// The cached page under `key`, without fetching.
    pub fn cached_tasks(&self, key: &QueryKey) -> Page<TwoMinuteTask> {
        match self.ctx.client.peek(key).data {
            Some(CacheData::TwoMinuteTasks(page)) => page,
            other => panic!("expected a task page, got {other:?}"),
        }
    }
}
