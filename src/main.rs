//! Binary entrypoint: tracing to the append-only process log, `.env` loading,
//! configuration, then the bot itself.

use commander_bot::errors::{Error, Result};
use commander_bot::{bot, config};
use dotenvy::dotenv;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Appends all tracing output to `logs/commander-bot.log`, ANSI off so the
/// file stays grep-friendly.
fn init_tracing() -> Result<()> {
    std::fs::create_dir_all("logs")?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("logs/commander-bot.log")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env first so RUST_LOG from the file reaches the filter
    dotenv().ok();

    // 2. Initialize tracing
    init_tracing()?;
    info!("Attempted to load .env file.");

    // 3. Load the main application configuration
    let app_config = config::load_app_configuration()?;
    info!("Successfully processed application configuration.");

    // 4. Run the bot
    // DISCORD_BOT_TOKEN is loaded here, directly before use, not stored in AppConfig
    let token = std::env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, Arc::new(app_config)).await?;

    info!("Bot shut down cleanly.");
    Ok(())
}
