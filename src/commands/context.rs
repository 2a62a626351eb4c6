//! Shared context for command handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: Reduced to the database, runtime config and uptime
//! - 1.0.0: Initial implementation with core shared state

use std::sync::Arc;
use std::time::Instant;

use crate::core::Config;
use crate::database::Database;

/// Shared context for all command handlers
#[derive(Clone)]
pub struct CommandContext {
    pub database: Database,
    pub config: Arc<Config>,
    pub start_time: Instant,
}

impl CommandContext {
    pub fn new(database: Database, config: Arc<Config>) -> Self {
        Self::with_start_time(database, config, Instant::now())
    }

    /// Create a CommandContext sharing the event handler's start time
    pub fn with_start_time(database: Database, config: Arc<Config>, start_time: Instant) -> Self {
        Self {
            database,
            config,
            start_time,
        }
    }

    /// Whether delivered reminders are mirrored to ntfy
    pub fn push_enabled(&self) -> bool {
        self.config.ntfy.is_some()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub fn test_config() -> Config {
        Config::from_lookup(|key| match key {
            "DISCORD_TOKEN" => Some("token".to_string()),
            _ => None,
        })
        .unwrap()
    }

    pub async fn test_context() -> CommandContext {
        let database = Database::new(":memory:").await.unwrap();
        CommandContext::new(database, Arc::new(test_config()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_context_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<CommandContext>();
    }

    #[tokio::test]
    async fn test_push_disabled_without_ntfy() {
        let ctx = testing::test_context().await;
        assert!(!ctx.push_enabled());
    }
}
