use super::{category_breakdown, day_streak, CategoryBreakdown};
use crate::config::InsightsConfig;
use crate::model::TwoMinuteTask;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completion at or under this many seconds honoured the rule.
pub const QUICK_WIN_SECONDS: u32 = 120;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoMinuteInsights {
    pub current_streak: u32,
    pub categories: Vec<CategoryBreakdown>,
    /// Share of timed completions that took two minutes or less, 0..=100.
    pub quick_win_rate: Option<f64>,
}

impl TwoMinuteInsights {
    pub fn compute<'a, I>(tasks: I, now: DateTime<Utc>, options: &InsightsConfig) -> Self
    where
        I: IntoIterator<Item = &'a TwoMinuteTask>,
    {
        let tasks: Vec<&TwoMinuteTask> = tasks.into_iter().collect();

        let timed: Vec<u32> = tasks
            .iter()
            .filter(|t| t.completed)
            .filter_map(|t| t.actual_duration_seconds)
            .collect();
        let quick = timed.iter().filter(|&&s| s <= QUICK_WIN_SECONDS).count();

        Self {
            current_streak: day_streak(
                now.date_naive(),
                tasks
                    .iter()
                    .filter(|t| t.completed)
                    .filter_map(|t| t.completed_at.map(|at| at.date_naive())),
                options.streak_lookback_days,
            ),
            categories: category_breakdown(tasks.iter().map(|t| {
                (
                    t.category.as_str(),
                    t.completed,
                    t.actual_duration_seconds.map(f64::from),
                )
            })),
            quick_win_rate: (!timed.is_empty())
                .then(|| quick as f64 / timed.len() as f64 * 100.0),
        }
    }
}
