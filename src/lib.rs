// Core layer - configuration, errors and message helpers
pub mod core;

// Features layer - reminders, ideas and push notifications
pub mod features;

// Persistence
pub mod database;

// Application layer
pub mod commands;

pub use core::{Config, ReminderError};
pub use database::Database;
pub use features::reminders::{NotificationDispatcher, ReminderScheduler, SchedulerConfig};
