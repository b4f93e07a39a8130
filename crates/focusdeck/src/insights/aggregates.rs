use super::{day_streak, mean};
use crate::model::{
    PomodoroSession, PomodoroStats, ProjectMinutes, RecordId, SessionType, TimeEntry, TimeStats,
    TwoMinuteStats, TwoMinuteTask,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

pub fn pomodoro_stats<'a, I>(sessions: I, now: DateTime<Utc>, lookback: u32) -> PomodoroStats
where
    I: IntoIterator<Item = &'a PomodoroSession>,
{
    let sessions: Vec<&PomodoroSession> = sessions.into_iter().collect();
    let today = now.date_naive();

    let completed_work: Vec<&PomodoroSession> = sessions
        .iter()
        .copied()
        .filter(|s| s.completed && s.session_type == SessionType::Work)
        .collect();
    let durations: Vec<f64> = completed_work
        .iter()
        .map(|s| f64::from(s.duration_minutes))
        .collect();

    let completed_sessions = sessions.iter().filter(|s| s.completed).count();
    let mut stats = PomodoroStats {
        total_sessions: sessions.len(),
        completed_sessions,
        interrupted_sessions: sessions.iter().filter(|s| s.interrupted).count(),
        total_focus_minutes: completed_work
            .iter()
            .map(|s| u64::from(s.duration_minutes))
            .sum(),
        today_sessions: completed_work
            .iter()
            .filter(|s| s.started_at.date_naive() == today)
            .count(),
        average_session_minutes: mean(&durations),
        completion_rate: 0.0,
        current_streak: day_streak(
            today,
            completed_work
                .iter()
                .map(|s| s.completed_at.unwrap_or(s.started_at).date_naive()),
            lookback,
        ),
    };
    stats.refresh_rate();
    stats
}

/// Only finished entries count; a running timer has no duration yet.
pub fn time_stats<'a, I>(entries: I, now: DateTime<Utc>) -> TimeStats
where
    I: IntoIterator<Item = &'a TimeEntry>,
{
    let today = now.date_naive();
    let week_start = now - Duration::days(7);
    let mut stats = TimeStats::default();
    let mut per_project: HashMap<Option<RecordId>, i64> = HashMap::new();

    for entry in entries {
        stats.entry_count += 1;
        let Some(minutes) = entry.duration_minutes() else {
            continue;
        };
        stats.total_minutes += minutes;
        if entry.start_time.date_naive() == today {
            stats.today_minutes += minutes;
        }
        if entry.start_time >= week_start {
            stats.week_minutes += minutes;
        }
        if entry.billable {
            stats.billable_minutes += minutes;
        }
        *per_project.entry(entry.project_id.clone()).or_default() += minutes;
    }

    let mut by_project: Vec<ProjectMinutes> = per_project
        .into_iter()
        .map(|(project_id, minutes)| ProjectMinutes {
            project_id,
            minutes,
        })
        .collect();
    by_project.sort_by(|a, b| {
        b.minutes
            .cmp(&a.minutes)
            .then_with(|| a.project_id.cmp(&b.project_id))
    });
    stats.by_project = by_project;
    stats
}

pub fn two_minute_stats<'a, I>(tasks: I, now: DateTime<Utc>, lookback: u32) -> TwoMinuteStats
where
    I: IntoIterator<Item = &'a TwoMinuteTask>,
{
    let tasks: Vec<&TwoMinuteTask> = tasks.into_iter().collect();
    let today = now.date_naive();
    let completed: Vec<&TwoMinuteTask> = tasks.iter().copied().filter(|t| t.completed).collect();
    let durations: Vec<f64> = completed
        .iter()
        .filter_map(|t| t.actual_duration_seconds.map(f64::from))
        .collect();

    let mut stats = TwoMinuteStats {
        total_tasks: tasks.len(),
        completed_tasks: completed.len(),
        active_tasks: tasks.len() - completed.len(),
        completion_rate: 0.0,
        average_completion_seconds: (!durations.is_empty()).then(|| mean(&durations)),
        today_completed: completed
            .iter()
            .filter(|t| t.completed_at.is_some_and(|at| at.date_naive() == today))
            .count(),
        current_streak: day_streak(
            today,
            completed
                .iter()
                .filter_map(|t| t.completed_at.map(|at| at.date_naive())),
            lookback,
        ),
    };
    stats.refresh_rate();
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Record, SessionDraft, SessionPatch, TimeEntryDraft, TwoMinuteTaskDraft, TwoMinuteTaskPatch,
    };
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 10, 15, 0, 0).unwrap()
    }

    fn completed_session(days_ago: i64, minutes: u32) -> PomodoroSession {
        let start = now() - Duration::days(days_ago) - Duration::hours(1);
        let mut session = PomodoroSession::from_draft(
            RecordId::generate(),
            SessionDraft::new("u1", SessionType::Work, minutes).started_at(start),
            start,
        );
        session.apply_patch(
            SessionPatch {
                completed: Some(true),
                ..Default::default()
            },
            start + Duration::minutes(i64::from(minutes)),
        );
        session
    }

    #[test]
    fn pomodoro_stats_count_completed_work() {
        let mut interrupted = completed_session(0, 25);
        interrupted.completed = false;
        interrupted.interrupted = true;
        let sessions = vec![
            completed_session(0, 25),
            completed_session(1, 50),
            completed_session(3, 25),
            interrupted,
        ];

        let stats = pomodoro_stats(&sessions, now(), 30);
        assert_eq!(stats.total_sessions, 4);
        assert_eq!(stats.completed_sessions, 3);
        assert_eq!(stats.interrupted_sessions, 1);
        assert_eq!(stats.total_focus_minutes, 100);
        assert_eq!(stats.today_sessions, 1);
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.completion_rate, 75.0);
    }

    #[test]
    fn time_stats_skip_running_entries() {
        let n = now();
        let entries = vec![
            TimeEntry::from_draft(
                RecordId::generate(),
                TimeEntryDraft::logged("u1", "a", n - Duration::minutes(90), n - Duration::minutes(30))
                    .billable(),
                n,
            ),
            TimeEntry::from_draft(
                RecordId::generate(),
                TimeEntryDraft::logged(
                    "u1",
                    "b",
                    n - Duration::days(10),
                    n - Duration::days(10) + Duration::minutes(15),
                ),
                n,
            ),
            TimeEntry::from_draft(RecordId::generate(), TimeEntryDraft::running("u1", "c"), n),
        ];

        let stats = time_stats(&entries, n);
        assert_eq!(stats.entry_count, 3);
        assert_eq!(stats.total_minutes, 75);
        assert_eq!(stats.today_minutes, 60);
        assert_eq!(stats.week_minutes, 60);
        assert_eq!(stats.billable_minutes, 60);
        assert_eq!(stats.by_project.len(), 1);
        assert_eq!(stats.by_project[0].minutes, 75);
    }

    #[test]
    fn two_minute_stats_average_only_completed() {
        let n = now();
        let mut done = TwoMinuteTask::from_draft(
            RecordId::generate(),
            TwoMinuteTaskDraft::new("u1", "Reply", 2),
            n,
        );
        done.apply_patch(TwoMinuteTaskPatch::complete(Some(90)), n);
        let open = TwoMinuteTask::from_draft(
            RecordId::generate(),
            TwoMinuteTaskDraft::new("u1", "Water plants", 1),
            n,
        );

        let stats = two_minute_stats([&done, &open], n, 30);
        assert_eq!(stats.total_tasks, 2);
        assert_eq!(stats.completed_tasks, 1);
        assert_eq!(stats.active_tasks, 1);
        assert_eq!(stats.completion_rate, 50.0);
        assert_eq!(stats.average_completion_seconds, Some(90.0));
        assert_eq!(stats.today_completed, 1);
        assert_eq!(stats.current_streak, 1);
    }
}
