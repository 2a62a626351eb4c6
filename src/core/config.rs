//! Environment-driven bot configuration
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Add ntfy push settings and reminder poller tuning
//! - 1.0.0: Initial release with token, guild, and database settings

use anyhow::{anyhow, Context, Result};
use std::time::Duration;

const DEFAULT_DATABASE_PATH: &str = "sphere.db";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;
const DEFAULT_DELIVERY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_NTFY_TOPIC: &str = "reminder_system";

/// Credentials and endpoint for the ntfy push side channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NtfyConfig {
    pub url: String,
    pub topic: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    /// Hub guild for fast command registration; commands go global when unset
    pub discord_guild_id: Option<String>,
    pub database_path: String,
    pub log_level: String,
    pub reminder_poll_interval: Duration,
    pub reminder_delivery_timeout: Duration,
    pub ntfy: Option<NtfyConfig>,
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values are treated the same as missing ones
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let discord_token = get("DISCORD_TOKEN").ok_or_else(|| anyhow!("DISCORD_TOKEN must be set"))?;

        let discord_guild_id = get("DISCORD_GUILD_ID");
        if let Some(ref id) = discord_guild_id {
            id.parse::<u64>()
                .with_context(|| format!("DISCORD_GUILD_ID is not a valid snowflake: {id}"))?;
        }

        let reminder_poll_interval = Duration::from_secs(parse_secs(
            get("REMINDER_POLL_INTERVAL_SECS"),
            "REMINDER_POLL_INTERVAL_SECS",
            DEFAULT_POLL_INTERVAL_SECS,
        )?);
        let reminder_delivery_timeout = Duration::from_secs(parse_secs(
            get("REMINDER_DELIVERY_TIMEOUT_SECS"),
            "REMINDER_DELIVERY_TIMEOUT_SECS",
            DEFAULT_DELIVERY_TIMEOUT_SECS,
        )?);

        let ntfy = match get("NTFY_URL") {
            Some(url) => {
                let username = get("NTFY_USER");
                let password = get("NTFY_PASSWORD");
                if username.is_some() != password.is_some() {
                    return Err(anyhow!(
                        "NTFY_USER and NTFY_PASSWORD must be set together"
                    ));
                }
                Some(NtfyConfig {
                    url: url.trim_end_matches('/').to_string(),
                    topic: get("NTFY_TOPIC")
                        .map(|t| t.trim_matches('/').to_string())
                        .unwrap_or_else(|| DEFAULT_NTFY_TOPIC.to_string()),
                    username,
                    password,
                })
            }
            None => None,
        };

        Ok(Config {
            discord_token,
            discord_guild_id,
            database_path: get("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            reminder_poll_interval,
            reminder_delivery_timeout,
            ntfy,
        })
    }
}

fn parse_secs(value: Option<String>, key: &str, default: u64) -> Result<u64> {
    let secs = match value {
        Some(v) => v
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds, got `{v}`"))?,
        None => default,
    };
    if secs == 0 {
        return Err(anyhow!("{key} must be at least 1 second"));
    }
    Ok(secs)
}
