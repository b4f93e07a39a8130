//! # Composition Root
//!
//! Nothing in the crate reaches for global state. [`initialize`] builds every
//! piece once and hands back a [`FocusContext`] that owns them:
//!
//! 1. a [`MockStore`] on the given clock, seeded when `seed.enabled` is set,
//! 2. a [`FocusApi`] over the store,
//! 3. a [`FocusClient`] with the configured cache policies and the services,
//! 4. a [`LocalStorage`] on the given key/value backend.
//!
//! [`initialize_default`] installs logging at the configured level and picks
//! the system clock and the file backend under the configured storage
//! directory. Tests pass a [`ManualClock`] and a
//! [`MemKv`] instead.
//!
//! [`ManualClock`]: crate::clock::ManualClock
//! [`MemKv`]: crate::prefs::MemKv

use crate::api::FocusApi;
use crate::client::FocusClient;
use crate::clock::{Clock, SystemClock};
use crate::config::FocusConfig;
use crate::error::Result;
use crate::logging;
use crate::prefs::{FsKv, KvBackend, LocalStorage};
use crate::services::Services;
use crate::store::seed::{self, SeedSummary};
use crate::store::MockStore;
use std::sync::Arc;

pub struct FocusContext<B: KvBackend> {
    pub client: FocusClient<MockStore>,
    pub storage: LocalStorage<B>,
    pub config: FocusConfig,
    /// What seeding produced, if it ran.
    pub seeded: Option<SeedSummary>,
}

impl<B: KvBackend> FocusContext<B> {
    /// The user whose data the app shows first.
    pub fn default_user(&self) -> &str {
        &self.config.seed.user_id
    }
}

pub fn initialize<B: KvBackend>(
    config: FocusConfig,
    clock: Arc<dyn Clock>,
    services: Services,
    backend: B,
) -> FocusContext<B> {
    let mut store = MockStore::new(clock.clone(), config.insights.clone());
    let seeded = config.seed.enabled.then(|| {
        let summary = seed::populate(&mut store, &config.seed);
        tracing::info!(
            user = %config.seed.user_id,
            days = config.seed.days,
            sessions = summary.sessions,
            gtd_items = summary.gtd_items,
            energy_levels = summary.energy_levels,
            time_entries = summary.time_entries,
            two_minute_tasks = summary.two_minute_tasks,
            "seeded store"
        );
        summary
    });

    let client = FocusClient::new(FocusApi::new(store), clock, config.cache.clone(), services);
    tracing::info!(seeded = seeded.is_some(), "focusdeck initialized");

    FocusContext {
        client,
        storage: LocalStorage::new(backend),
        config,
        seeded,
    }
}

/// Wall clock, logging services and file-backed local storage. Installs the
/// tracing subscriber at `log_level` unless the host already has one.
pub fn initialize_default(config: FocusConfig) -> Result<FocusContext<FsKv>> {
    logging::init(&config.log_level)?;
    let backend = FsKv::from_config(&config)?;
    tracing::debug!(root = %backend.root().display(), "local storage");
    Ok(initialize(
        config,
        Arc::new(SystemClock),
        Services::default(),
        backend,
    ))
}
