//! # Focusdeck Architecture
//!
//! Focusdeck is the **data core of a personal productivity app**: pomodoro
//! sessions, GTD items and projects, energy check-ins, time tracking and
//! two-minute tasks. It has no UI. A UI drives it through [`FocusClient`] and
//! renders whatever the client hands back.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Client Layer (client/)                                     │
//! │  - Queries served from the cache, fetched when stale        │
//! │  - Optimistic mutations with snapshot rollback              │
//! │  - Side effects: toasts, reminders, sounds, XP (services)   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Cache Layer (cache/)                                       │
//! │  - Entries keyed by user + query                            │
//! │  - Staleness, polling, fetch generations, subscriptions     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - REST-shaped facade, draft validation, request log        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - Repository / DataStore traits                            │
//! │  - MockStore (in memory), derived stats, seeding            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`insights`] holds the pure computations behind the stats and insight
//! records. [`prefs`] keeps UI preferences and a manual time log in
//! key/value slots outside the store. [`app`] wires everything together.
//!
//! ## No Globals
//!
//! The store, clock and services are constructed once and passed in. Two
//! contexts built side by side never share state, which is what lets every
//! test run on its own [`ManualClock`] and [`MockStore`].
//!
//! ## Testing Strategy
//!
//! - **Store and insights**: unit tests next to the code, on a pinned clock.
//! - **Cache and client**: unit tests drive [`FocusClient`] against a
//!   [`MockStore`] with failure injection switched on and off, and compare
//!   [`QueryCache::dump`] output before and after a rolled back write.
//! - **End to end**: `tests/` builds a full context through [`app::initialize`].
//!
//! [`ManualClock`]: clock::ManualClock
//! [`QueryCache::dump`]: cache::QueryCache::dump

pub mod api;
pub mod app;
pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod insights;
pub mod logging;
pub mod model;
pub mod prefs;
pub mod services;
pub mod store;

pub use api::FocusApi;
pub use app::{initialize, initialize_default, FocusContext};
pub use client::{FocusClient, MutationResult};
pub use config::FocusConfig;
pub use error::{FocusError, Result};
pub use store::{DataStore, MockStore, Repository};
