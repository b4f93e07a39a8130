//! # Configuration
//!
//! Focusdeck configuration is managed by [`confique`], which handles layered loading
//! from a TOML file, environment variables and compiled defaults.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `FOCUSDECK_LOG_LEVEL`, `FOCUSDECK_SEED_USER`, etc.
//! 2. **Config file**: `focusdeck.toml` passed to [`FocusConfig::load`].
//! 3. **Compiled defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `log_level` | `info` | Level for the `focusdeck` tracing target |
//! | `storage_dir` | OS data dir | Where local preference slots are written |
//! | `cache.list_stale_secs` | `30` | Age after which list queries refetch |
//! | `cache.stats_stale_secs` | `60` | Same, for stats and insight queries |
//! | `cache.settings_stale_secs` | `300` | Same, for the settings singleton |
//! | `cache.active_poll_secs` | `10` | Poll interval of the active timer/session |
//! | `cache.gc_secs` | `300` | Unobserved entries older than this are dropped |
//! | `cache.refetch_on_focus` | `true` | Refetch stale observed queries on focus |
//! | `cache.page_size` | `20` | Default page size for list queries |
//! | `seed.enabled` | `true` | Seed synthetic records at startup |
//! | `seed.user_id` | `demo-user` | Owner of the seeded records |
//! | `seed.rng_seed` | `42` | Seed for the synthetic data generator |
//! | `seed.days` | `14` | How many past days get seeded |
//! | `insights.streak_lookback_days` | `30` | Upper bound of a streak walk |
//! | `insights.trend_window` | `14` | Most recent samples used for trends |
//! | `insights.min_hour_samples` | `2` | Samples needed for an hour to rank |
//! | `insights.ranked_hours` | `3` | Peak/low hours returned |

use crate::error::Result;
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FocusConfig {
    /// Level for the `focusdeck` tracing target (trace, debug, info, warn, error).
    #[config(default = "info", env = "FOCUSDECK_LOG_LEVEL")]
    pub log_level: String,

    /// Directory for local preference slots. Defaults to the OS data directory.
    #[config(env = "FOCUSDECK_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    #[config(nested)]
    pub cache: CacheConfig,

    #[config(nested)]
    pub seed: SeedConfig,

    #[config(nested)]
    pub insights: InsightsConfig,
}

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    #[config(default = 30)]
    pub list_stale_secs: u64,

    #[config(default = 60)]
    pub stats_stale_secs: u64,

    #[config(default = 300)]
    pub settings_stale_secs: u64,

    #[config(default = 10)]
    pub active_poll_secs: u64,

    #[config(default = 300)]
    pub gc_secs: u64,

    #[config(default = true)]
    pub refetch_on_focus: bool,

    #[config(default = 20)]
    pub page_size: usize,
}

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SeedConfig {
    #[config(default = true, env = "FOCUSDECK_SEED_ENABLED")]
    pub enabled: bool,

    #[config(default = "demo-user", env = "FOCUSDECK_SEED_USER")]
    pub user_id: String,

    #[config(default = 42)]
    pub rng_seed: u64,

    #[config(default = 14)]
    pub days: u32,
}

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InsightsConfig {
    #[config(default = 30)]
    pub streak_lookback_days: u32,

    #[config(default = 14)]
    pub trend_window: usize,

    #[config(default = 2)]
    pub min_hour_samples: usize,

    #[config(default = 3)]
    pub ranked_hours: usize,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            storage_dir: None,
            cache: CacheConfig::default(),
            seed: SeedConfig::default(),
            insights: InsightsConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            list_stale_secs: 30,
            stats_stale_secs: 60,
            settings_stale_secs: 300,
            active_poll_secs: 10,
            gc_secs: 300,
            refetch_on_focus: true,
            page_size: 20,
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            user_id: "demo-user".to_string(),
            rng_seed: 42,
            days: 14,
        }
    }
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            streak_lookback_days: 30,
            trend_window: 14,
            min_hour_samples: 2,
            ranked_hours: 3,
        }
    }
}

impl FocusConfig {
    /// Load from environment, then `path` (if it exists), then compiled defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = FocusConfig::builder().env();
        if let Some(path) = path {
            builder = builder.file(path);
        }
        Ok(builder.load()?)
    }

    /// Storage directory, falling back to the platform data directory.
    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.storage_dir.clone().or_else(|| {
            directories::ProjectDirs::from("", "", "focusdeck")
                .map(|dirs| dirs.data_local_dir().to_path_buf())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_matches_compiled_defaults() {
        let loaded = FocusConfig::builder().load().unwrap();
        assert_eq!(loaded.cache, CacheConfig::default());
        assert_eq!(loaded.seed, SeedConfig::default());
        assert_eq!(loaded.insights, InsightsConfig::default());
        assert_eq!(loaded.log_level, "info");
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "log_level = \"debug\"\n\n[cache]\nactive_poll_secs = 5\n\n[seed]\ndays = 3"
        )
        .unwrap();

        let config = FocusConfig::builder().file(file.path()).load().unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.cache.active_poll_secs, 5);
        assert_eq!(config.cache.list_stale_secs, 30);
        assert_eq!(config.seed.days, 3);
        assert!(config.seed.enabled);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = FocusConfig::builder()
            .file(dir.path().join("absent.toml"))
            .load()
            .unwrap();
        assert_eq!(config.cache.page_size, 20);
    }

    #[test]
    fn serialized_defaults_round_trip_through_toml() {
        let text = toml::to_string(&FocusConfig::default()).unwrap();
        let parsed: FocusConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, FocusConfig::default());
    }

    #[test]
    fn explicit_storage_dir_wins() {
        let config = FocusConfig {
            storage_dir: Some(PathBuf::from("/tmp/focusdeck-test")),
            ..Default::default()
        };
        assert_eq!(
            config.storage_dir(),
            Some(PathBuf::from("/tmp/focusdeck-test"))
        );
    }
}
