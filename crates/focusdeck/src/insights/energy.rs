use super::{mean, rank_hours, trend, HourAverage, Trend};
use crate::config::InsightsConfig;
use crate::model::EnergyLevel;
use chrono::Timelike;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyInsights {
    pub samples: usize,
    pub average_level: f64,
    pub trend: Trend,
    pub peak_hours: Vec<HourAverage>,
    pub low_hours: Vec<HourAverage>,
}

impl EnergyInsights {
    pub fn compute<'a, I>(levels: I, options: &InsightsConfig) -> Self
    where
        I: IntoIterator<Item = &'a EnergyLevel>,
    {
        let mut levels: Vec<&EnergyLevel> = levels.into_iter().collect();
        levels.sort_by_key(|l| l.recorded_at);

        let values: Vec<f64> = levels.iter().map(|l| f64::from(l.level)).collect();
        let window_start = values.len().saturating_sub(options.trend_window);
        let (peak_hours, low_hours) = rank_hours(
            levels
                .iter()
                .map(|l| (l.recorded_at.hour(), f64::from(l.level))),
            options.min_hour_samples,
            options.ranked_hours,
        );

        Self {
            samples: values.len(),
            average_level: mean(&values),
            trend: trend(&values[window_start..]),
            peak_hours,
            low_hours,
        }
    }
}
