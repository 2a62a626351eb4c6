//! Idea command handlers
//!
//! Handles: idea (save, list)
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{error, info, warn};
use serenity::model::application::interaction::application_command::{
    ApplicationCommandInteraction, CommandDataOption,
};
use serenity::prelude::Context;
use std::sync::Arc;
use uuid::Uuid;

use crate::commands::context::CommandContext;
use crate::commands::handler::{respond, unknown_subcommand_text, SlashCommandHandler};
use crate::commands::slash::{get_integer_option, get_string_option, get_subcommand};
use crate::core::fit_lines_for_message;
use crate::features::ideas::{parse_tags, Idea, IdeaStore, NewIdea, DEFAULT_CATEGORY};

const DEFAULT_LIST_LIMIT: usize = 10;
const MAX_LIST_LIMIT: usize = 25;

pub struct IdeaHandler;

#[async_trait]
impl SlashCommandHandler for IdeaHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["idea"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let (subcommand, options) = get_subcommand(&command.data.options)
            .ok_or_else(|| anyhow!("Missing /idea subcommand"))?;
        let owner = command.user.id.to_string();

        let reply = match subcommand {
            "save" => save_from_options(&ctx.database, &owner, options).await,
            "list" => {
                let limit = list_limit(get_integer_option(options, "limit"));
                list_for(&ctx.database, &owner, limit).await
            }
            other => {
                warn!("Unknown /idea subcommand: {other}");
                unknown_subcommand_text("idea", other)
            }
        };

        respond(serenity_ctx, command, &reply, true).await
    }
}

/// Requested list size clamped to what one message can reasonably show
fn list_limit(requested: Option<i64>) -> usize {
    requested
        .and_then(|n| usize::try_from(n).ok())
        .map(|n| n.clamp(1, MAX_LIST_LIMIT))
        .unwrap_or(DEFAULT_LIST_LIMIT)
}

fn idea_from_options(owner: &str, options: &[CommandDataOption]) -> Option<NewIdea> {
    let title = get_string_option(options, "title")?;
    let mut idea = NewIdea::new(owner, title);
    idea.content = get_string_option(options, "content");
    if let Some(category) = get_string_option(options, "category") {
        idea.category = category;
    }
    idea.tags = get_string_option(options, "tags")
        .map(|raw| parse_tags(&raw))
        .unwrap_or_default();
    idea.source = Some("discord".to_string());
    Some(idea)
}

async fn save_from_options(store: &dyn IdeaStore, owner: &str, options: &[CommandDataOption]) -> String {
    let request_id = Uuid::new_v4();
    let Some(idea) = idea_from_options(owner, options) else {
        return "❌ An idea needs a title.".to_string();
    };

    match store.save_idea(idea).await {
        Ok(saved) => {
            info!("[{request_id}] Saved idea {} for user {owner}", saved.id);
            saved_text(&saved)
        }
        Err(e) => {
            error!("[{request_id}] Failed to save idea for {owner}: {e}");
            format!("❌ Could not save your idea: {e}")
        }
    }
}

async fn list_for(store: &dyn IdeaStore, owner: &str, limit: usize) -> String {
    match store.list_ideas(owner, limit).await {
        Ok(ideas) => render_idea_list(&ideas),
        Err(e) => {
            error!("Failed to list ideas for {owner}: {e}");
            "❌ Could not load your ideas right now, please try again later.".to_string()
        }
    }
}

fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| format!("#{t}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn saved_text(idea: &Idea) -> String {
    let mut text = format!("💡 Saved idea `#{}` **{}**", idea.id, idea.title);
    if idea.category != DEFAULT_CATEGORY {
        text.push_str(&format!(" in `{}`", idea.category));
    }
    if !idea.tags.is_empty() {
        text.push_str(&format!(" {}", format_tags(&idea.tags)));
    }
    text
}

pub fn render_idea_list(ideas: &[Idea]) -> String {
    if ideas.is_empty() {
        return "You have no saved ideas yet! Use `/idea save` to add one.".to_string();
    }
    let lines: Vec<String> = ideas
        .iter()
        .map(|idea| {
            let pin = if idea.pinned { "📌 " } else { "" };
            let mut line = format!("{pin}`#{}` **{}** [{}]", idea.id, idea.title, idea.category);
            if !idea.tags.is_empty() {
                line.push(' ');
                line.push_str(&format_tags(&idea.tags));
            }
            line
        })
        .collect();
    fit_lines_for_message("💡 **Your ideas:**\n", &lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use serde_json::json;

    // Option type 3 is STRING in the Discord API
    fn string_option(name: &str, value: &str) -> CommandDataOption {
        serde_json::from_value(json!({
            "name": name,
            "type": 3,
            "value": value,
        }))
        .unwrap()
    }

    #[test]
    fn test_idea_handler_commands() {
        assert_eq!(IdeaHandler.command_names(), &["idea"]);
    }

    #[test]
    fn test_list_limit() {
        assert_eq!(list_limit(None), DEFAULT_LIST_LIMIT);
        assert_eq!(list_limit(Some(0)), 1);
        assert_eq!(list_limit(Some(5)), 5);
        assert_eq!(list_limit(Some(500)), MAX_LIST_LIMIT);
        assert_eq!(list_limit(Some(-3)), DEFAULT_LIST_LIMIT);
    }

    #[test]
    fn test_idea_from_options() {
        let options = vec![
            string_option("title", "garden lights"),
            string_option("category", "Home"),
            string_option("tags", "solar, outdoor"),
        ];
        let idea = idea_from_options("42", &options).unwrap();
        assert_eq!(idea.title, "garden lights");
        assert_eq!(idea.category, "Home");
        assert_eq!(idea.tags, vec!["solar".to_string(), "outdoor".to_string()]);
        assert_eq!(idea.source.as_deref(), Some("discord"));

        assert!(idea_from_options("42", &[]).is_none());
    }

    #[tokio::test]
    async fn test_save_and_list_through_store() {
        let db = Database::new(":memory:").await.unwrap();
        let options = vec![
            string_option("title", "garden lights"),
            string_option("tags", "solar"),
        ];

        let reply = save_from_options(&db, "42", &options).await;
        assert!(reply.starts_with("💡 Saved idea `#1` **garden lights**"));
        assert!(reply.ends_with("#solar"));

        let listing = list_for(&db, "42", 10).await;
        assert!(listing.contains("`#1` **garden lights** [general] #solar"));
        assert!(list_for(&db, "7", 10).await.starts_with("You have no saved ideas"));
    }

    #[tokio::test]
    async fn test_blank_title_is_reported() {
        let db = Database::new(":memory:").await.unwrap();
        let reply = save_from_options(&db, "42", &[string_option("title", "  ")]).await;
        assert!(reply.starts_with("❌ Could not save your idea"));
    }
}
