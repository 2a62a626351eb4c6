//! # Command System
//!
//! Slash command (/) handling for Discord interactions.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Registry dispatch only; reminder and idea command groups
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 2.0.0: Remove bang commands, slash-only command system

pub mod context;
pub mod handler;
pub mod handlers;
pub mod registry;
pub mod slash;

pub use context::CommandContext;
pub use handler::{respond, SlashCommandHandler};
pub use registry::CommandRegistry;

pub use slash::{
    create_slash_commands, get_integer_option, get_string_option, get_subcommand,
    register_global_commands, register_guild_commands,
};
