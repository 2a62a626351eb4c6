//! # Features Layer
//!
//! - **reminders**: natural-language reminders delivered by a background poller
//! - **ideas**: idea capture with categories and tags
//! - **notifications**: ntfy push side channel

pub mod ideas;
pub mod notifications;
pub mod reminders;

/// Bot version from Cargo.toml
pub fn get_bot_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
