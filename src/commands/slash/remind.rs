//! Reminder slash commands: /reminder set, /reminder list

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

/// Creates reminder commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![create_reminder_command()]
}

fn create_reminder_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("reminder")
        .description("Set and list reminders delivered by DM")
        .create_option(|set| {
            set.name("set")
                .description("Set a new reminder")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|option| {
                    option
                        .name("time")
                        .description("When to remind you, e.g. `in 2 hours`, `1h30m`, `tomorrow at 9am`")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
                .create_sub_option(|option| {
                    option
                        .name("message")
                        .description("What to remind you about")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
        })
        .create_option(|list| {
            list.name("list")
                .description("List your ongoing reminders")
                .kind(CommandOptionType::SubCommand)
        })
        .to_owned()
}
