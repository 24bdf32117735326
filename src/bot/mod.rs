//! Bot layer - Discord-specific interface: slash commands, gateway event
//! listeners, and the framework context shared by both.

/// Slash command implementations (fun, utility)
pub mod commands;
/// Gateway event listeners (welcome flow, server-activity logging)
pub mod handlers;
/// Lazily-resolved cache for the server-activity log channel
pub mod log_channel;

use crate::config::AppConfig;
use crate::errors;
use crate::notifier::Notifier;
use log_channel::LogChannelCache;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info};

/// Shared data available to all commands and event listeners.
pub struct Data {
    /// Process-wide configuration.
    pub config: Arc<AppConfig>,
    /// Shared HTTP client for adapter and image requests.
    pub http: reqwest::Client,
    /// Fire-and-forget usage analytics.
    pub notifier: Notifier,
    /// Resolve-once handle to the log channel.
    pub log_channel: LogChannelCache,
}

// Type aliases for the error and context types Poise will use
pub(crate) type Error = errors::Error;
/// Poise context alias used by every command.
pub type Context<'a> = poise::Context<'a, Data, Error>;

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            panic!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx
                .say("Something went wrong while running that command. Please try again later.")
                .await
            {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Records command usage after the response has already been sent, so the
/// telemetry side channel cannot affect the user-facing result.
async fn record_command_usage(ctx: Context<'_>) {
    ctx.data().notifier.command_used(
        &ctx.command().qualified_name,
        ctx.author().id.get(),
        ctx.guild_id().map(serenity::GuildId::get),
        ctx.channel_id().get(),
    );
}

/// Builds the Poise framework and runs the client until shutdown.
///
/// # Errors
/// Returns an error if the client cannot be constructed or the gateway
/// connection fails irrecoverably.
pub async fn run_bot(token: String, app_config: Arc<AppConfig>) -> errors::Result<()> {
    let http = reqwest::Client::new();
    let notifier = Notifier::new(http.clone(), app_config.analytics.clone());
    let log_channel = LogChannelCache::new(app_config.log_channel_id);

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::echo(),
                commands::weather(),
                commands::help(),
                commands::welcome(),
                commands::cocktail(),
                commands::eightball(),
                commands::roll(),
                commands::joke(),
                commands::meme(),
                commands::qotd(),
                commands::bored(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            post_command: |ctx| Box::pin(record_command_usage(ctx)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(Data {
                    config: app_config,
                    http,
                    notifier,
                    log_channel,
                })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("Shutdown signal received, stopping shards...");
        shard_manager.shutdown_all().await;
    });

    info!("Starting bot client...");
    client.start().await?;
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
