//! # External Collaborators
//!
//! The client reaches outside the crate for four things: user-facing toasts,
//! reminder scheduling, sound effects and experience points. Each is a trait so
//! the host application can plug in real implementations.
//!
//! [`Services::default`] wires logging no-ops. [`ServiceLog`] records every call
//! instead, which is what tests use to assert side effects.

use crate::error::{FocusError, Result};
use crate::model::{GtdItem, RecordId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

pub trait Notifier {
    /// Show a transient message.
    fn notify(&self, level: MessageLevel, message: &str);
}

pub trait ReminderScheduler {
    fn schedule(&self, item: &GtdItem, at: DateTime<Utc>) -> Result<()>;
}

pub trait SoundEffects {
    fn play_click(&self);
    fn play_notification(&self);
}

pub trait Gamification {
    fn award_xp(&self, amount: u32, reason: &str) -> Result<()>;
}

pub struct Services {
    pub notifier: Box<dyn Notifier>,
    pub reminders: Box<dyn ReminderScheduler>,
    pub sounds: Box<dyn SoundEffects>,
    pub gamification: Box<dyn Gamification>,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            notifier: Box::new(Logged),
            reminders: Box::new(Logged),
            sounds: Box::new(Logged),
            gamification: Box::new(Logged),
        }
    }
}

/// Writes every call to the log and does nothing else.
struct Logged;

impl Notifier for Logged {
    fn notify(&self, level: MessageLevel, message: &str) {
        match level {
            MessageLevel::Error | MessageLevel::Warning => tracing::warn!(?level, message, "toast"),
            MessageLevel::Info | MessageLevel::Success => tracing::info!(?level, message, "toast"),
        }
    }
}

impl ReminderScheduler for Logged {
    fn schedule(&self, item: &GtdItem, at: DateTime<Utc>) -> Result<()> {
        tracing::info!(item = %item.id, %at, "reminder scheduled");
        Ok(())
    }
}

impl SoundEffects for Logged {
    fn play_click(&self) {
        tracing::trace!("click");
    }

    fn play_notification(&self) {
        tracing::trace!("notification sound");
    }
}

impl Gamification for Logged {
    fn award_xp(&self, amount: u32, reason: &str) -> Result<()> {
        tracing::info!(amount, reason, "xp awarded");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    Toast { level: MessageLevel, message: String },
    Reminder { item_id: RecordId, at: DateTime<Utc> },
    Click,
    Notification,
    Xp { amount: u32, reason: String },
}

/// Shared recorder behind every service. Clones see the same calls.
#[derive(Debug, Clone, Default)]
pub struct ServiceLog {
    calls: Rc<RefCell<Vec<ServiceCall>>>,
    fail_reminders: Rc<Cell<bool>>,
}

impl ServiceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A [`Services`] bundle that records into this log.
    pub fn services(&self) -> Services {
        Services {
            notifier: Box::new(self.clone()),
            reminders: Box::new(self.clone()),
            sounds: Box::new(self.clone()),
            gamification: Box::new(self.clone()),
        }
    }

    /// Make [`ReminderScheduler::schedule`] fail from now on.
    pub fn set_fail_reminders(&self, fail: bool) {
        self.fail_reminders.set(fail);
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.borrow().clone()
    }

    pub fn toasts(&self) -> Vec<(MessageLevel, String)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                ServiceCall::Toast { level, message } => Some((*level, message.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn total_xp(&self) -> u32 {
        self.calls
            .borrow()
            .iter()
            .map(|call| match call {
                ServiceCall::Xp { amount, .. } => *amount,
                _ => 0,
            })
            .sum()
    }

    fn push(&self, call: ServiceCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl Notifier for ServiceLog {
    fn notify(&self, level: MessageLevel, message: &str) {
        self.push(ServiceCall::Toast {
            level,
            message: message.to_string(),
        });
    }
}

impl ReminderScheduler for ServiceLog {
    fn schedule(&self, item: &GtdItem, at: DateTime<Utc>) -> Result<()> {
        if self.fail_reminders.get() {
            return Err(FocusError::Service(format!(
                "Could not schedule a reminder for \"{}\"",
                item.title
            )));
        }
        self.push(ServiceCall::Reminder {
            item_id: item.id.clone(),
            at,
        });
        Ok(())
    }
}

impl SoundEffects for ServiceLog {
    fn play_click(&self) {
        self.push(ServiceCall::Click);
    }

    fn play_notification(&self) {
        self.push(ServiceCall::Notification);
    }
}

impl Gamification for ServiceLog {
    fn award_xp(&self, amount: u32, reason: &str) -> Result<()> {
        self.push(ServiceCall::Xp {
            amount,
            reason: reason.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GtdItemDraft, Record};

    #[test]
    fn log_is_shared_between_clones() {
        let log = ServiceLog::new();
        let services = log.services();
        services.notifier.notify(MessageLevel::Error, "Failed to create item");
        services.sounds.play_click();
        services.gamification.award_xp(10, "task").unwrap();
        services.gamification.award_xp(5, "item").unwrap();

        assert_eq!(
            log.toasts(),
            vec![(MessageLevel::Error, "Failed to create item".to_string())]
        );
        assert_eq!(log.total_xp(), 15);
        assert_eq!(log.calls().len(), 4);
    }

    #[test]
    fn reminders_can_be_made_to_fail() {
        let log = ServiceLog::new();
        let item = GtdItem::from_draft(RecordId::generate(), GtdItemDraft::capture("u1", "Pay rent"), Utc::now());
        log.set_fail_reminders(true);
        let err = log.services().reminders.schedule(&item, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("Pay rent"));
        assert!(log.calls().is_empty());
    }

    #[test]
    fn default_services_never_fail() {
        let services = Services::default();
        assert!(services.gamification.award_xp(1, "noop").is_ok());
        services.notifier.notify(MessageLevel::Info, "hello");
    }

    #[test]
    fn levels_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&MessageLevel::Warning).unwrap(), "\"warning\"");
    }
}
