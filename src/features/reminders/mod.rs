//! # Reminders Feature
//!
//! Users schedule reminders with natural-language times; a background poller
//! delivers due ones by DM (plus an optional ntfy push) and marks them sent.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Split into store, dispatcher, and scheduler seams; ordered listing returns results
//! - 1.0.0: Initial release

pub mod dispatcher;
pub mod model;
pub mod scheduler;
pub mod store;
pub mod time_parse;

pub use dispatcher::{
    ChatPlatform, DeliveryReport, NotificationDispatcher, PushOutcome, Recipient, SerenityChat,
};
pub use model::{NewReminder, Reminder};
pub use scheduler::{ReminderScheduler, SchedulerConfig, SchedulerHandle, TickSummary};
pub use store::{due_or_empty, pending_or_empty, ReminderStore};
pub use time_parse::{format_duration, parse_time};
