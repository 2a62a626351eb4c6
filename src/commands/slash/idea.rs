//! Idea slash commands: /idea save, /idea list

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

/// Creates idea commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![create_idea_command()]
}

fn create_idea_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("idea")
        .description("Capture ideas with a category and tags")
        .create_option(|save| {
            save.name("save")
                .description("Save a new idea")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|option| {
                    option
                        .name("title")
                        .description("Short title of the idea")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
                .create_sub_option(|option| {
                    option
                        .name("content")
                        .description("Longer notes")
                        .kind(CommandOptionType::String)
                        .required(false)
                })
                .create_sub_option(|option| {
                    option
                        .name("category")
                        .description("Category name (defaults to general)")
                        .kind(CommandOptionType::String)
                        .required(false)
                })
                .create_sub_option(|option| {
                    option
                        .name("tags")
                        .description("Comma separated tags, e.g. `home, network`")
                        .kind(CommandOptionType::String)
                        .required(false)
                })
        })
        .create_option(|list| {
            list.name("list")
                .description("List your latest ideas")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|option| {
                    option
                        .name("limit")
                        .description("How many ideas to show (1-25)")
                        .kind(CommandOptionType::Integer)
                        .min_int_value(1)
                        .max_int_value(25)
                        .required(false)
                })
        })
        .to_owned()
}
