//! # Slash Commands (/)
//!
//! Discord native slash command definitions and option helpers.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: `/reminder` and `/idea` subcommand groups
//! - 1.0.0: Reorganized from monolithic slash_commands.rs

mod idea;
mod remind;
mod utility;

use anyhow::Result;
use log::info;
use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::{Command, CommandOptionType};
use serenity::model::application::interaction::application_command::CommandDataOption;
use serenity::model::id::GuildId;
use serenity::prelude::Context;

/// Creates all slash command definitions
pub fn create_slash_commands() -> Vec<CreateApplicationCommand> {
    let mut commands = Vec::new();

    // Utility commands
    commands.extend(utility::create_commands());

    // Reminder commands
    commands.extend(remind::create_commands());

    // Idea commands
    commands.extend(idea::create_commands());

    commands
}

/// Registers all slash commands globally
pub async fn register_global_commands(ctx: &Context) -> Result<()> {
    let slash_commands = create_slash_commands();
    let count = slash_commands.len();

    Command::set_global_application_commands(&ctx.http, |commands| {
        for command in slash_commands {
            commands.add_application_command(command);
        }
        commands
    })
    .await?;

    info!("Global slash commands registered successfully ({count} commands)");
    Ok(())
}

/// Registers all slash commands for a specific guild (faster to propagate)
pub async fn register_guild_commands(ctx: &Context, guild_id: GuildId) -> Result<()> {
    let slash_commands = create_slash_commands();
    let count = slash_commands.len();

    guild_id
        .set_application_commands(&ctx.http, |commands| {
            for command in slash_commands {
                commands.add_application_command(command);
            }
            commands
        })
        .await?;

    info!("Guild slash commands registered for guild {guild_id} ({count} commands)");
    Ok(())
}

/// The invoked subcommand and its own options
pub fn get_subcommand(options: &[CommandDataOption]) -> Option<(&str, &[CommandDataOption])> {
    options
        .iter()
        .find(|opt| opt.kind == CommandOptionType::SubCommand)
        .map(|opt| (opt.name.as_str(), opt.options.as_slice()))
}

/// Utility function to get string option from slash command
pub fn get_string_option(options: &[CommandDataOption], name: &str) -> Option<String> {
    options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_ref())
        .and_then(|val| val.as_str())
        .map(|s| s.to_string())
}

/// Utility function to get integer option from slash command
pub fn get_integer_option(options: &[CommandDataOption], name: &str) -> Option<i64> {
    options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_ref())
        .and_then(|val| val.as_i64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn command_names() -> Vec<String> {
        create_slash_commands()
            .iter()
            .map(|cmd| cmd.0.get("name").unwrap().as_str().unwrap().to_string())
            .collect()
    }

    fn option_names(command: &str) -> Vec<String> {
        let commands = create_slash_commands();
        let cmd = commands
            .iter()
            .find(|cmd| cmd.0.get("name").and_then(Value::as_str) == Some(command))
            .unwrap();
        cmd.0
            .get("options")
            .and_then(Value::as_array)
            .map(|opts| {
                opts.iter()
                    .filter_map(|o| o.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_create_slash_commands() {
        let names = command_names();
        for expected in ["ping", "help", "reminder", "idea"] {
            assert!(names.contains(&expected.to_string()), "Missing command: {expected}");
        }
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_reminder_subcommands() {
        assert_eq!(option_names("reminder"), vec!["set", "list"]);
    }

    #[test]
    fn test_idea_subcommands() {
        assert_eq!(option_names("idea"), vec!["save", "list"]);
    }

    #[test]
    fn test_descriptions_fit_discord_limit() {
        for cmd in create_slash_commands() {
            let description = cmd.0.get("description").and_then(Value::as_str).unwrap();
            assert!(!description.is_empty() && description.len() <= 100);
        }
    }

    #[test]
    fn test_option_helpers_on_empty_options() {
        assert_eq!(get_string_option(&[], "time"), None);
        assert_eq!(get_integer_option(&[], "limit"), None);
        assert!(get_subcommand(&[]).is_none());
    }
}
