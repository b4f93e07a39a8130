//! # Derived Insights
//!
//! Statistics and insights are pure recomputations over a snapshot of records.
//! Nothing here is incrementally maintained: callers hand in the full record set
//! and get a fresh value back.
//!
//! The building blocks are deliberately simple:
//!
//! - [`trend`]: two-bucket comparison of the first and second half of a window.
//! - [`rank_hours`]: per-hour averages, ranked for peaks and lows.
//! - [`day_streak`]: consecutive days with activity, walking back from today.
//! - [`category_breakdown`]: per-category totals and completion times.
//!
//! [`aggregates`] builds the stats records the store keeps per user, the other
//! submodules build the insight views served straight to the cache.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub mod aggregates;
pub mod energy;
pub mod two_minute;

pub use energy::EnergyInsights;
pub use two_minute::TwoMinuteInsights;

/// Minimum change between half-window averages that counts as movement.
pub const TREND_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

/// Compare the average of the second half of `values` with the first half.
///
/// `values` must be in time order. With fewer than two values there is nothing
/// to compare and the trend is stable.
pub fn trend(values: &[f64]) -> Trend {
    if values.len() < 2 {
        return Trend::Stable;
    }
    let (first, second) = values.split_at(values.len() / 2);
    let delta = mean(second) - mean(first);
    if delta > TREND_THRESHOLD {
        Trend::Improving
    } else if delta < -TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourAverage {
    pub hour: u32,
    pub average: f64,
    pub samples: usize,
}

/// Bucket `(hour, value)` samples by hour of day and rank the buckets.
///
/// Only hours with at least `min_samples` samples qualify. Returns
/// `(peaks, lows)`, each at most `top` long: peaks by descending average,
/// lows by ascending average, ties broken by earlier hour.
pub fn rank_hours<I>(samples: I, min_samples: usize, top: usize) -> (Vec<HourAverage>, Vec<HourAverage>)
where
    I: IntoIterator<Item = (u32, f64)>,
{
    let mut buckets: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for (hour, value) in samples {
        buckets.entry(hour).or_default().push(value);
    }

    let qualified: Vec<HourAverage> = buckets
        .into_iter()
        .filter(|(_, values)| values.len() >= min_samples)
        .map(|(hour, values)| HourAverage {
            hour,
            average: mean(&values),
            samples: values.len(),
        })
        .collect();

    let mut peaks = qualified.clone();
    peaks.sort_by(|a, b| b.average.total_cmp(&a.average).then(a.hour.cmp(&b.hour)));
    peaks.truncate(top);

    let mut lows = qualified;
    lows.sort_by(|a, b| a.average.total_cmp(&b.average).then(a.hour.cmp(&b.hour)));
    lows.truncate(top);

    (peaks, lows)
}

/// Count consecutive days, starting at `today`, that appear in `dates`.
///
/// Stops at the first day without activity or after `lookback` days.
pub fn day_streak<I>(today: NaiveDate, dates: I, lookback: u32) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let active: HashSet<NaiveDate> = dates.into_iter().collect();
    let mut streak = 0;
    for offset in 0..lookback {
        let day = today - Duration::days(i64::from(offset));
        if !active.contains(&day) {
            break;
        }
        streak += 1;
    }
    streak
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub category: String,
    pub total: usize,
    pub completed: usize,
    /// Averaged over completed items that recorded a duration only.
    pub average_completion_seconds: Option<f64>,
}

/// Group `(category, completed, completion_seconds)` rows by category.
///
/// Largest categories come first, ties in name order.
pub fn category_breakdown<'a, I>(rows: I) -> Vec<CategoryBreakdown>
where
    I: IntoIterator<Item = (&'a str, bool, Option<f64>)>,
{
    let mut groups: BTreeMap<&str, (usize, usize, Vec<f64>)> = BTreeMap::new();
    for (category, completed, seconds) in rows {
        let group = groups.entry(category).or_default();
        group.0 += 1;
        if completed {
            group.1 += 1;
            if let Some(seconds) = seconds {
                group.2.push(seconds);
            }
        }
    }

    let mut breakdown: Vec<CategoryBreakdown> = groups
        .into_iter()
        .map(|(category, (total, completed, durations))| CategoryBreakdown {
            category: category.to_string(),
            total,
            completed,
            average_completion_seconds: (!durations.is_empty()).then(|| mean(&durations)),
        })
        .collect();
    breakdown.sort_by(|a, b| b.total.cmp(&a.total).then(a.category.cmp(&b.category)));
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn trend_compares_half_windows() {
        assert_eq!(trend(&[3.0, 3.0, 7.0, 7.0]), Trend::Improving);
        assert_eq!(trend(&[7.0, 7.0, 3.0, 3.0]), Trend::Declining);
        assert_eq!(trend(&[5.0, 5.2, 5.1, 5.4]), Trend::Stable);
    }

    #[test]
    fn trend_needs_two_values() {
        assert_eq!(trend(&[]), Trend::Stable);
        assert_eq!(trend(&[9.0]), Trend::Stable);
    }

    #[test]
    fn trend_threshold_is_exclusive() {
        // delta exactly 0.5 is not enough
        assert_eq!(trend(&[5.0, 5.5]), Trend::Stable);
        assert_eq!(trend(&[5.0, 5.6]), Trend::Improving);
    }

    #[test]
    fn rank_hours_requires_min_samples() {
        let samples = vec![
            (9, 8.0),
            (9, 9.0),
            (14, 3.0),
            (14, 4.0),
            (20, 10.0), // single sample, ignored
            (11, 6.0),
            (11, 6.0),
        ];
        let (peaks, lows) = rank_hours(samples, 2, 3);
        let peak_hours: Vec<u32> = peaks.iter().map(|h| h.hour).collect();
        let low_hours: Vec<u32> = lows.iter().map(|h| h.hour).collect();
        assert_eq!(peak_hours, vec![9, 11, 14]);
        assert_eq!(low_hours, vec![14, 11, 9]);
        assert_eq!(peaks[0].average, 8.5);
        assert_eq!(peaks[0].samples, 2);
    }

    #[test]
    fn rank_hours_truncates_to_top() {
        let samples = (0..6).flat_map(|h| [(h, h as f64), (h, h as f64)]);
        let (peaks, lows) = rank_hours(samples, 2, 3);
        assert_eq!(peaks.iter().map(|h| h.hour).collect::<Vec<_>>(), vec![5, 4, 3]);
        assert_eq!(lows.iter().map(|h| h.hour).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn streak_stops_at_first_gap() {
        let today = day(20);
        let dates = [day(20), day(19), day(18), day(16), day(15), day(14)];
        assert_eq!(day_streak(today, dates, 30), 3);
    }

    #[test]
    fn streak_is_zero_without_activity_today() {
        assert_eq!(day_streak(day(20), [day(19), day(18)], 30), 0);
    }

    #[test]
    fn streak_is_bounded_by_lookback() {
        let today = day(31);
        let dates = (1..=31).map(day);
        assert_eq!(day_streak(today, dates, 30), 30);
        assert_eq!(day_streak(today, (1..=31).map(day), 7), 7);
    }

    #[test]
    fn breakdown_averages_completed_only() {
        let rows = vec![
            ("email", true, Some(60.0)),
            ("email", true, Some(120.0)),
            ("email", false, None),
            ("errands", false, None),
        ];
        let breakdown = category_breakdown(rows);
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].category, "email");
        assert_eq!(breakdown[0].total, 3);
        assert_eq!(breakdown[0].completed, 2);
        assert_eq!(breakdown[0].average_completion_seconds, Some(90.0));
        assert_eq!(breakdown[1].category, "errands");
        assert_eq!(breakdown[1].average_completion_seconds, None);
    }
}
