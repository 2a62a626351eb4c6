//! Utility command handlers
//!
//! Handles: ping, help
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: Help text covers reminders and ideas; ping reports uptime
//! - 1.0.0: Extracted from command_handler.rs

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;
use std::time::Duration;

use crate::commands::context::CommandContext;
use crate::commands::handler::{respond, SlashCommandHandler};
use crate::features::get_bot_version;

/// Handler for utility commands: ping, help
pub struct UtilityHandler;

#[async_trait]
impl SlashCommandHandler for UtilityHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["ping", "help"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        match command.data.name.as_str() {
            "ping" => {
                let text = ping_text(ctx.start_time.elapsed());
                respond(serenity_ctx, command, &text, false).await?;
                info!("Ping command completed for user {}", command.user.id);
                Ok(())
            }
            "help" => respond(serenity_ctx, command, &help_text(ctx.push_enabled()), true).await,
            _ => Ok(()),
        }
    }
}

fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn ping_text(uptime: Duration) -> String {
    format!(
        "Pong! 🏓 (v{}, up {})",
        get_bot_version(),
        format_uptime(uptime)
    )
}

fn help_text(push_enabled: bool) -> String {
    let push = if push_enabled {
        "Delivered reminders are also sent as push notifications."
    } else {
        "Push notifications are not configured."
    };
    format!(
        r#"**Available Slash Commands:**
`/reminder set <time> <message>` - Get a DM when the time comes
`/reminder list` - Show your ongoing reminders
`/idea save <title> [content] [category] [tags]` - Capture an idea
`/idea list [limit]` - Show your latest ideas
`/ping` - Test bot responsiveness
`/help` - Show this help message

**Time formats:**
`30m`, `1h30m`, `in 2 hours`, `tomorrow at 9am`, `friday at 6pm`, `2025-03-01 14:00`
All times are UTC.

{push}"#
    )
}
