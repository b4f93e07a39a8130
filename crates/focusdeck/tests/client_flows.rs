mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{Harness, USER};
use focusdeck::cache::{CacheData, Query, QueryKey};
use focusdeck::model::{
    GtdItem, GtdItemDraft, ListParams, SettingsPatch, TaskStatusFilter, TwoMinuteFilter,
    TwoMinuteTask, TwoMinuteTaskDraft,
};
use focusdeck::services::MessageLevel;
use focusdeck::MutationResult;
use std::collections::HashSet;

#[test]
fn cursor_walk_visits_every_record_once() {
    let mut h = Harness::new();
    for n in 0..45 {
        // Every third task shares a timestamp with the previous one.
        if n % 3 != 0 {
            h.clock.advance(Duration::seconds(1));
        }
        h.ctx
            .client
            .create_task(TwoMinuteTaskDraft::new(USER, format!("Task {n}"), 1))
            .committed()
            .unwrap();
    }

    let filter = TwoMinuteFilter::with_status(TaskStatusFilter::All);
    let mut params = ListParams::new(filter, 10);
    let mut seen = Vec::new();
    let mut created = Vec::new();
    loop {
        let page = h
            .ctx
            .client
            .api()
            .list::<TwoMinuteTask>(USER, &params)
            .unwrap();
        assert_eq!(page.total, 45);
        seen.extend(page.items.iter().map(|t| t.id.clone()));
        created.extend(page.items.iter().map(|t| t.created_at));
        match page.next_cursor {
            Some(cursor) if page.has_next => params = params.after(cursor),
            _ => {
                assert!(!page.has_next);
                break;
            }
        }
    }
    assert!(created.windows(2).all(|w| w[0] >= w[1]));
    let unique: HashSet<_> = seen.iter().cloned().collect();
    assert_eq!(seen.len(), 45);
    assert_eq!(unique.len(), 45);
}

#[test]
fn failed_create_restores_the_cache_exactly() {
    let mut h = Harness::new();
    h.ctx
        .client
        .create_task(TwoMinuteTaskDraft::new(USER, "Reply to Sam", 1))
        .committed()
        .unwrap();
    let list = h.active_tasks_key();
    let stats = QueryKey::new(USER, Query::TwoMinuteStats);
    h.ctx.client.query(&list);
    h.ctx.client.query(&stats);
    let before = h.ctx.client.cache().dump().unwrap();

    h.ctx.client.api().store().set_simulate_write_error(true);
    let result = h
        .ctx
        .client
        .create_task(TwoMinuteTaskDraft::new(USER, "Lost task", 2));

    assert_eq!(result, MutationResult::RolledBack);
    assert_eq!(h.ctx.client.cache().dump().unwrap(), before);
    let toasts = h.log.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].0, MessageLevel::Error);
}

#[test]
fn new_task_lands_at_the_head_and_delete_drops_total_by_one() {
    let mut h = Harness::new();
    for title in ["Water plants", "Book dentist"] {
        h.ctx
            .client
            .create_task(TwoMinuteTaskDraft::new(USER, title, 1))
            .committed()
            .unwrap();
        h.clock.advance(Duration::seconds(10));
    }
    let list = h.active_tasks_key();
    h.ctx.client.query(&list);
    let total_before = h.cached_tasks(&list).total;

    let pending = h.ctx.client.begin(
        focusdeck::client::CreateRecord::<TwoMinuteTask>::new(TwoMinuteTaskDraft::new(
            USER,
            "File report",
            2,
        )),
    );
    let optimistic = h.cached_tasks(&list);
    assert_eq!(optimistic.items[0].title, "File report");
    assert!(optimistic.items[0].id.is_temp());
    assert_eq!(optimistic.total, total_before + 1);

    let created = h.ctx.client.settle(pending).committed().unwrap();
    let page = match h.ctx.client.query(&list).data {
        Some(CacheData::TwoMinuteTasks(page)) => page,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(page.items[0].id, created.id);
    assert!(!page.items[0].id.is_temp());
    assert_eq!(page.total, total_before + 1);

    assert!(h
        .ctx
        .client
        .delete_task(USER, created.id)
        .committed()
        .unwrap());
    let page = match h.ctx.client.query(&list).data {
        Some(CacheData::TwoMinuteTasks(page)) => page,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(page.total, total_before);
    assert!(page.items.iter().all(|t| t.title != "File report"));
}

#[test]
fn settings_patches_merge_instead_of_replacing() {
    let mut h = Harness::new();
    h.ctx.client.update_settings(
        USER,
        SettingsPatch {
            work_minutes: Some(50),
            ..Default::default()
        },
    );
    h.ctx.client.update_settings(
        USER,
        SettingsPatch {
            daily_goal: Some(6),
            ..Default::default()
        },
    );

    let settings = h.ctx.client.current_settings(USER);
    assert_eq!(settings.work_minutes, 50);
    assert_eq!(settings.daily_goal, 6);
    assert_eq!(settings.short_break_minutes, 5);
    assert_eq!(settings.long_break_minutes, 15);

    let stored = h.ctx.client.api().settings(USER).unwrap();
    assert_eq!(stored.work_minutes, 50);
    assert_eq!(stored.daily_goal, 6);
}

#[test]
fn streak_counts_utc_days_across_midnight() {
    fn finish(h: &mut Harness, title: &str) {
        let task = h
            .ctx
            .client
            .create_task(TwoMinuteTaskDraft::new(USER, title, 1))
            .committed()
            .unwrap();
        assert!(h.ctx.client.complete_task(USER, task.id, Some(60)).is_committed());
    }

    let mut h = Harness::new();
    h.clock.set(Utc.with_ymd_and_hms(2026, 6, 10, 23, 59, 30).unwrap());
    finish(&mut h, "Late one");
    h.clock.set(Utc.with_ymd_and_hms(2026, 6, 11, 0, 0, 30).unwrap());
    finish(&mut h, "Early one");

    let stats = h.ctx.client.api().two_minute_stats(USER).unwrap();
    assert_eq!(stats.current_streak, 2);
    assert_eq!(stats.today_completed, 1);

    // A skipped day breaks the streak once stats are recomputed.
    h.clock.set(Utc.with_ymd_and_hms(2026, 6, 13, 10, 0, 0).unwrap());
    h.ctx
        .client
        .create_task(TwoMinuteTaskDraft::new(USER, "Fresh start", 1));
    let stats = h.ctx.client.api().two_minute_stats(USER).unwrap();
    assert_eq!(stats.current_streak, 0);
}

#[test]
fn streak_stops_at_the_first_gap() {
    let mut h = Harness::new();
    // Today is June 9th; June 6th has nothing, June 5th is older history.
    for day in [5, 7, 8, 9] {
        h.clock.set(Utc.with_ymd_and_hms(2026, 6, day, 15, 0, 0).unwrap());
        let task = h
            .ctx
            .client
            .create_task(TwoMinuteTaskDraft::new(USER, format!("Day {day}"), 1))
            .committed()
            .unwrap();
        assert!(h.ctx.client.complete_task(USER, task.id, None).is_committed());
    }
    let stats = h.ctx.client.api().two_minute_stats(USER).unwrap();
    assert_eq!(stats.current_streak, 3);
    assert_eq!(stats.completed_tasks, 4);
}

#[test]
fn two_overlapping_toggles_cancel_out() {
    let mut h = Harness::new();
    let item = h
        .ctx
        .client
        .capture(GtdItemDraft::capture(USER, "Move house").with_subtasks(["Pack"]))
        .committed()
        .unwrap();
    let pack = item.subtasks[0].id.clone();
    let items = QueryKey::new(USER, Query::GtdItems(h.ctx.client.first_page()));
    h.ctx.client.query(&items);

    let first = h
        .ctx
        .client
        .begin_toggle_subtask(USER, item.id.clone(), &pack)
        .unwrap();
    let second = h
        .ctx
        .client
        .begin_toggle_subtask(USER, item.id.clone(), &pack)
        .unwrap();
    assert!(h.ctx.client.settle(first).is_committed());
    assert!(h.ctx.client.settle(second).is_committed());

    let stored = h
        .ctx
        .client
        .api()
        .get::<GtdItem>(&item.id)
        .unwrap()
        .unwrap();
    assert!(!stored.subtask(&pack).unwrap().completed);
}

#[test]
fn fresh_cache_does_not_hit_the_store() {
    let mut h = Harness::new();
    let list = h.active_tasks_key();
    h.ctx.client.query(&list);
    let requests = h.ctx.client.api().request_count();

    h.clock.advance(Duration::seconds(5));
    h.ctx.client.query(&list);
    assert_eq!(h.ctx.client.api().request_count(), requests);

    h.clock.advance(Duration::seconds(60));
    h.ctx.client.query(&list);
    assert_eq!(h.ctx.client.api().request_count(), requests + 1);
}
