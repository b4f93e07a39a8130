//! Synthetic history for a demo user.
//!
//! Record contents depend only on [`SeedConfig::rng_seed`] and the store clock;
//! ids are fresh UUIDs on every run.

use super::memory::MockStore;
use crate::config::SeedConfig;
use crate::model::{
    EnergyLevel, EnergyLevelDraft, GtdCategory, GtdItem, GtdItemDraft, GtdItemPatch, GtdProject,
    GtdProjectDraft, Mood, PomodoroSession, Priority, Record, RecordId, SessionDraft,
    SessionPatch, SessionType, TimeEntry, TimeEntryDraft, TimeProject, TimeProjectDraft,
    TwoMinuteTask, TwoMinuteTaskDraft, TwoMinuteTaskPatch,
};
use chrono::{DateTime, Duration, DurationRound, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const MOODS: [Mood; 5] = [Mood::Great, Mood::Good, Mood::Neutral, Mood::Low, Mood::Drained];
const QUICK_TASKS: [(&str, &str); 6] = [
    ("Reply to team thread", "email"),
    ("Archive newsletters", "email"),
    ("Water the plants", "home"),
    ("Book dentist", "errands"),
    ("File receipt", "admin"),
    ("Update status", "admin"),
];
const CAPTURES: [&str; 8] = [
    "Draft quarterly plan",
    "Call the landlord",
    "Research standing desks",
    "Renew passport",
    "Learn a new recipe",
    "Wait for design review",
    "Clean up downloads folder",
    "Plan weekend hike",
];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub sessions: usize,
    pub gtd_items: usize,
    pub energy_levels: usize,
    pub time_entries: usize,
    pub two_minute_tasks: usize,
}

/// Fill `store` with `config.days` days of history ending today.
pub fn populate(store: &mut MockStore, config: &SeedConfig) -> SeedSummary {
    let mut rng = StdRng::seed_from_u64(config.rng_seed);
    let user = config.user_id.as_str();
    let now = store.now();
    let midnight = now.duration_trunc(Duration::days(1)).unwrap_or(now);
    let mut summary = SeedSummary::default();

    let time_projects = ["Client work", "Side project"].map(|name| {
        let project = TimeProject::from_draft(
            RecordId::generate(),
            TimeProjectDraft::new(user, name),
            midnight - Duration::days(i64::from(config.days)),
        );
        store.insert(project.clone());
        project.id
    });
    let gtd_project = GtdProject::from_draft(
        RecordId::generate(),
        GtdProjectDraft::new(user, "Home office"),
        midnight - Duration::days(i64::from(config.days)),
    );
    store.insert(gtd_project.clone());

    for day in (0..config.days).rev() {
        let base = midnight - Duration::days(i64::from(day));
        let at = |hour: u32, minute: u32| -> Option<DateTime<Utc>> {
            let t = base + Duration::hours(i64::from(hour)) + Duration::minutes(i64::from(minute));
            (t <= now).then_some(t)
        };

        for _ in 0..rng.gen_range(2..=5) {
            let Some(start) = at(rng.gen_range(8..18), rng.gen_range(0..60)) else {
                continue;
            };
            let mut session = PomodoroSession::from_draft(
                RecordId::generate(),
                SessionDraft::new(user, SessionType::Work, 25).started_at(start),
                start,
            );
            let end = start + Duration::minutes(25);
            if rng.gen_bool(0.8) && end <= now {
                session.apply_patch(
                    SessionPatch {
                        completed: Some(true),
                        completed_at: Some(end),
                        ..Default::default()
                    },
                    end,
                );
            } else {
                session.apply_patch(
                    SessionPatch {
                        interrupted: Some(true),
                        ..Default::default()
                    },
                    start + Duration::minutes(rng.gen_range(3..20)),
                );
            }
            store.insert(session);
            summary.sessions += 1;
        }

        for _ in 0..rng.gen_range(1..=3) {
            let Some(recorded) = at(rng.gen_range(7..22), 0) else {
                continue;
            };
            let mut draft = EnergyLevelDraft::new(user, rng.gen_range(3..=9)).recorded_at(recorded);
            if let Some(mood) = MOODS.choose(&mut rng) {
                draft = draft.with_mood(*mood);
            }
            store.insert(EnergyLevel::from_draft(RecordId::generate(), draft, recorded));
            summary.energy_levels += 1;
        }

        for project_id in &time_projects {
            let Some(start) = at(rng.gen_range(9..16), 0) else {
                continue;
            };
            let end = (start + Duration::minutes(rng.gen_range(20..120))).min(now);
            let mut draft = TimeEntryDraft::logged(user, "Focused work", start, end)
                .for_project(project_id.clone());
            if rng.gen_bool(0.5) {
                draft = draft.billable();
            }
            store.insert(TimeEntry::from_draft(RecordId::generate(), draft, start));
            summary.time_entries += 1;
        }

        for _ in 0..rng.gen_range(1..=3) {
            let Some(created) = at(rng.gen_range(8..20), rng.gen_range(0..60)) else {
                continue;
            };
            let Some((title, category)) = QUICK_TASKS.choose(&mut rng) else {
                continue;
            };
            let mut task = TwoMinuteTask::from_draft(
                RecordId::generate(),
                TwoMinuteTaskDraft::new(user, *title, rng.gen_range(1..=2)).in_category(*category),
                created,
            );
            let finished = created + Duration::minutes(rng.gen_range(1..30));
            if rng.gen_bool(0.7) && finished <= now {
                task.apply_patch(
                    TwoMinuteTaskPatch::complete(Some(rng.gen_range(30..=180))),
                    finished,
                );
            }
            store.insert(task);
            summary.two_minute_tasks += 1;
        }
    }

    for (i, title) in CAPTURES.iter().enumerate() {
        let category = GtdCategory::VIEWS[i % GtdCategory::VIEWS.len()];
        let created = now - Duration::hours(rng.gen_range(1..72));
        let mut draft = GtdItemDraft::capture(user, *title).in_category(category);
        draft.priority = *[Priority::Low, Priority::Medium, Priority::High]
            .choose(&mut rng)
            .unwrap_or(&Priority::Medium);
        if category == GtdCategory::NextAction {
            draft = draft.with_context("@computer");
            draft.project_id = Some(gtd_project.id.clone());
        }
        if category == GtdCategory::WaitingFor {
            draft.waiting_on = Some("Alex".to_string());
        }
        let mut item = GtdItem::from_draft(RecordId::generate(), draft, created);
        if rng.gen_bool(0.2) {
            item.apply_patch(
                GtdItemPatch {
                    completed: Some(true),
                    ..Default::default()
                },
                created + Duration::minutes(30),
            );
        }
        store.insert(item);
        summary.gtd_items += 1;
    }

    store.refresh_all_stats();
    tracing::info!(
        user,
        sessions = summary.sessions,
        gtd_items = summary.gtd_items,
        energy_levels = summary.energy_levels,
        time_entries = summary.time_entries,
        two_minute_tasks = summary.two_minute_tasks,
        "Seeded demo data"
    );
    summary
}
