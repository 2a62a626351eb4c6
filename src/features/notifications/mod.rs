//! # Push Notifications Feature
//!
//! Best-effort side channel for delivered reminders.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: true (enabled when `NTFY_URL` is set)

pub mod ntfy;

use async_trait::async_trait;

use crate::core::ReminderError;

pub use ntfy::NtfyClient;

/// A push service that accepts a text message for a topic
#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn send(&self, topic: &str, text: &str) -> Result<(), ReminderError>;
}
