//! Reminder command handlers
//!
//! Handles: reminder (set, list)
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: Natural-language times, per-user list numbers, ephemeral replies
//! - 1.0.0: Extracted from command_handler.rs

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serenity::model::application::interaction::application_command::{
    ApplicationCommandInteraction, CommandDataOption,
};
use serenity::prelude::Context;
use std::sync::Arc;
use uuid::Uuid;

use crate::commands::context::CommandContext;
use crate::commands::handler::{respond, unknown_subcommand_text, SlashCommandHandler};
use crate::commands::slash::{get_string_option, get_subcommand};
use crate::core::{fit_lines_for_message, ReminderError};
use crate::features::reminders::{
    format_duration, parse_time, pending_or_empty, NewReminder, Reminder, ReminderStore,
};

const EMPTY_LIST: &str = "You have no ongoing reminders!";
const LIST_HEADER: &str = "📋 **Your reminders:**\n";

/// Handler for the /reminder command group
pub struct RemindHandler;

#[async_trait]
impl SlashCommandHandler for RemindHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["reminder"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let (subcommand, options) = get_subcommand(&command.data.options)
            .ok_or_else(|| anyhow!("Missing /reminder subcommand"))?;

        match subcommand {
            "set" => self.handle_set(&ctx, serenity_ctx, command, options).await,
            "list" => self.handle_list(&ctx, serenity_ctx, command).await,
            other => {
                warn!("Unknown /reminder subcommand: {other}");
                respond(serenity_ctx, command, &unknown_subcommand_text("reminder", other), true)
                    .await
            }
        }
    }
}

impl RemindHandler {
    async fn handle_set(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        options: &[CommandDataOption],
    ) -> Result<()> {
        let request_id = Uuid::new_v4();
        let time_text = get_string_option(options, "time")
            .ok_or_else(|| anyhow!("Missing time parameter"))?;
        let message = get_string_option(options, "message")
            .ok_or_else(|| anyhow!("Missing message parameter"))?;

        let request = ReminderRequest {
            owner: command.user.id.to_string(),
            channel_id: Some(command.channel_id.to_string()),
            guild_id: command.guild_id.map(|id| id.to_string()),
            time_text,
            message,
        };

        let now = Utc::now();
        let reply = match create_reminder(&ctx.database, request, now).await {
            Ok(reminder) => {
                info!(
                    "[{request_id}] Reminder {} (#{}) set for user {} {} ({})",
                    reminder.id,
                    reminder.list_id,
                    reminder.owner,
                    describe_delay(&reminder, now),
                    reminder.remind_at
                );
                confirmation_text(&reminder)
            }
            Err(e) if e.is_user_facing() => {
                info!("[{request_id}] Rejected reminder from {}: {e}", command.user.id);
                format!("❌ {e}\nTry something like `in 2 hours`, `1h30m` or `tomorrow at 9am`.")
            }
            Err(e) => {
                error!("[{request_id}] Failed to store reminder for {}: {e}", command.user.id);
                "❌ Could not save your reminder right now, please try again later.".to_string()
            }
        };

        respond(serenity_ctx, command, &reply, true).await
    }

    async fn handle_list(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let owner = command.user.id.to_string();
        let reminders = pending_or_empty(&ctx.database, Some(&owner)).await;
        info!("Listing {} reminders for user {owner}", reminders.len());

        respond(serenity_ctx, command, &render_reminder_list(&reminders), true).await
    }
}

/// Everything `/reminder set` needs from the interaction
#[derive(Debug, Clone)]
pub struct ReminderRequest {
    pub owner: String,
    pub channel_id: Option<String>,
    pub guild_id: Option<String>,
    pub time_text: String,
    pub message: String,
}

/// Parse the requested time against `now` and persist the reminder
pub async fn create_reminder(
    store: &dyn ReminderStore,
    request: ReminderRequest,
    now: DateTime<Utc>,
) -> Result<Reminder, ReminderError> {
    let remind_at = parse_time(&request.time_text, now)?;
    let reminder = NewReminder::new(request.owner, request.message.trim(), remind_at)
        .with_origin(request.channel_id, request.guild_id);
    store.create(reminder).await
}

/// Ephemeral reply to a successful `/reminder set`
pub fn confirmation_text(reminder: &Reminder) -> String {
    format!(
        "⏰ Reminder `{}` set for <t:{}:R>!",
        reminder.message,
        reminder.remind_at.timestamp()
    )
}

/// One line per reminder: list number, relative time, message
pub fn render_reminder_list(reminders: &[Reminder]) -> String {
    if reminders.is_empty() {
        return EMPTY_LIST.to_string();
    }
    let lines: Vec<String> = reminders
        .iter()
        .map(|r| {
            format!(
                "`#{}` [<t:{}:R>]: {}",
                r.list_id,
                r.remind_at.timestamp(),
                r.message
            )
        })
        .collect();
    fit_lines_for_message(LIST_HEADER, &lines)
}

/// How far away a reminder is, in words
pub fn describe_delay(reminder: &Reminder, now: DateTime<Utc>) -> String {
    let seconds = (reminder.remind_at - now).num_seconds();
    if seconds <= 0 {
        "any moment now".to_string()
    } else {
        format!("in {}", format_duration(seconds))
    }
}
