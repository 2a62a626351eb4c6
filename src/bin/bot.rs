use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use serenity::async_trait;
use serenity::model::application::interaction::Interaction;
use serenity::model::gateway::Ready;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use std::sync::Arc;
use std::time::Instant;

use sphere::commands::{
    register_global_commands, register_guild_commands, respond, CommandContext, CommandRegistry,
};
use sphere::core::Config;
use sphere::database::Database;
use sphere::features::notifications::NtfyClient;
use sphere::features::reminders::{
    NotificationDispatcher, ReminderScheduler, SchedulerConfig, SerenityChat,
};

struct Handler {
    registry: CommandRegistry,
    context: Arc<CommandContext>,
    guild_id: Option<GuildId>,
}

impl Handler {
    fn new(context: CommandContext, guild_id: Option<GuildId>) -> Self {
        let registry = CommandRegistry::with_default_handlers();
        info!("📋 Slash command handlers: /{}", registry.command_names().join(", /"));
        Self {
            registry,
            context: Arc::new(context),
            guild_id,
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        let registration = match self.guild_id {
            Some(guild_id) => register_guild_commands(&ctx, guild_id).await,
            None => register_global_commands(&ctx).await,
        };
        if let Err(e) = registration {
            error!("Failed to register slash commands: {e}");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::ApplicationCommand(command) = interaction else {
            return;
        };

        let Some(handler) = self.registry.get(&command.data.name) else {
            warn!("No handler for slash command '{}'", command.data.name);
            return;
        };

        if let Err(e) = handler.handle(self.context.clone(), &ctx, &command).await {
            error!(
                "Error handling slash command '{}': {}",
                command.data.name, e
            );
            let reply = "❌ Sorry, I encountered an error processing your command. Please try again.";
            if let Err(why) = respond(&ctx, &command, reply, true).await {
                error!("Failed to send error message: {why}");
            }
        }
    }
}

fn build_dispatcher(config: &Config, chat: SerenityChat) -> NotificationDispatcher {
    let dispatcher = NotificationDispatcher::new(Arc::new(chat));
    let Some(ntfy) = &config.ntfy else {
        info!("🔕 NTFY_URL not set, push notifications disabled");
        return dispatcher;
    };
    match NtfyClient::new(ntfy) {
        Ok(client) => {
            info!("🔔 Push notifications enabled (topic: {})", ntfy.topic);
            dispatcher.with_push(Arc::new(client), ntfy.topic.clone())
        }
        Err(e) => {
            error!("Failed to create ntfy client, push notifications disabled: {e}");
            dispatcher
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Arc::new(Config::from_env()?);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting sphere v{}...", sphere::features::get_bot_version());

    let database = Database::new(&config.database_path).await?;

    let guild_id = config
        .discord_guild_id
        .as_ref()
        .and_then(|id| id.parse::<u64>().ok())
        .map(GuildId);

    let context = CommandContext::with_start_time(database.clone(), config.clone(), Instant::now());
    let handler = Handler::new(context, guild_id);

    let intents = GatewayIntents::GUILDS | GatewayIntents::DIRECT_MESSAGES;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Bot configured successfully. Connecting to Discord gateway...");

    // Start the reminder scheduler
    let http = client.cache_and_http.http.clone();
    let dispatcher = build_dispatcher(&config, SerenityChat::new(http));
    let scheduler = Arc::new(ReminderScheduler::new(
        Arc::new(database),
        dispatcher,
        SchedulerConfig {
            interval: config.reminder_poll_interval,
            attempt_timeout: config.reminder_delivery_timeout,
        },
    ));
    let scheduler_handle = scheduler.start();

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {e}");
            return;
        }
        info!("Shutdown requested, closing gateway connection...");
        shard_manager.lock().await.shutdown_all().await;
    });

    info!("Establishing WebSocket connection to Discord gateway...");
    let result = client.start().await;

    scheduler_handle.stop().await;

    if let Err(why) = result {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
