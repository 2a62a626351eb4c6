//! # Core Module
//!
//! Configuration, the reminder error taxonomy, and Discord message helpers.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod config;
pub mod error;
pub mod response;

// Re-export commonly used items
pub use config::Config;
pub use error::ReminderError;
pub use response::{fit_lines_for_message, truncate_for_message, MESSAGE_LIMIT};
