//! Utility slash commands: /ping, /help

use serenity::builder::CreateApplicationCommand;

/// Creates utility commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        CreateApplicationCommand::default()
            .name("ping")
            .description("Check that the bot is alive")
            .to_owned(),
        CreateApplicationCommand::default()
            .name("help")
            .description("Show what the bot can do")
            .to_owned(),
    ]
}
