//! Reminder persistence contract
//!
//! `Database` is the production implementation; the poller and command
//! handlers only see this trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::error;

use super::model::{NewReminder, Reminder};
use crate::core::ReminderError;

#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Validate and persist a reminder, assigning its id and per-owner `list_id`
    async fn create(&self, reminder: NewReminder) -> Result<Reminder, ReminderError>;

    /// Unsent reminders with `remind_at <= now`, optionally for one owner
    ///
    /// No ordering is guaranteed.
    async fn load_due(
        &self,
        owner: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reminder>, ReminderError>;

    /// All unsent reminders ordered by `remind_at` ascending
    async fn load_pending_ordered(&self, owner: Option<&str>)
        -> Result<Vec<Reminder>, ReminderError>;

    /// Flip `sent` for exactly this id; repeated or unknown ids are no-ops
    async fn mark_sent(&self, id: i64) -> Result<(), ReminderError>;

    /// `1 + max(list_id)` over the owner's unsent reminders, or 1 if none
    async fn next_list_id(&self, owner: &str) -> Result<i64, ReminderError>;
}

/// Due reminders, degrading to an empty batch when the store fails
pub async fn due_or_empty(
    store: &dyn ReminderStore,
    owner: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<Reminder> {
    match store.load_due(owner, now).await {
        Ok(reminders) => reminders,
        Err(e) => {
            error!("Failed to load due reminders (owner: {owner:?}): {e}");
            Vec::new()
        }
    }
}

/// Pending reminders for display, degrading to an empty list when the store fails
pub async fn pending_or_empty(store: &dyn ReminderStore, owner: Option<&str>) -> Vec<Reminder> {
    match store.load_pending_ordered(owner).await {
        Ok(reminders) => reminders,
        Err(e) => {
            error!("Failed to load pending reminders (owner: {owner:?}): {e}");
            Vec::new()
        }
    }
}
