//! Application configuration, collected once at startup from environment
//! variables (a `.env` file is loaded by `main` before this runs).
//!
//! The Discord token is deliberately *not* stored here: it is read directly
//! before client construction and its absence is fatal. Everything in
//! [`AppConfig`] is optional in the sense that a missing value degrades one
//! feature rather than stopping the process; each degradation is reported
//! exactly once, at load time.

use crate::errors::Result;
use std::path::PathBuf;
use tracing::{info, warn};

/// Default presence text ("Watching {status}").
const DEFAULT_STATUS: &str = "the server";

/// Immutable process-wide configuration, passed explicitly to every component
/// that needs it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Presence text shown as "Watching {`status_text`}".
    pub status_text: String,
    /// Channel that receives server-activity embeds. `None` disables them.
    pub log_channel_id: Option<u64>,
    /// OpenWeatherMap API key. `None` turns `/weather` into a polite
    /// configuration notice.
    pub weather_api_key: Option<String>,
    /// Usage-analytics side channel. `None` disables it silently.
    pub analytics: Option<AnalyticsConfig>,
    /// Welcome-image asset locations.
    pub welcome: WelcomeConfig,
}

/// Credentials for the fire-and-forget analytics endpoint.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub api_key: String,
    pub project_id: String,
    /// Optional Discord-style webhook mirrored alongside each event.
    pub webhook_url: Option<String>,
}

/// Where the welcome-image compositor finds its assets.
#[derive(Debug, Clone)]
pub struct WelcomeConfig {
    /// Directory holding the background pool.
    pub background_dir: PathBuf,
    /// Background filenames within [`Self::background_dir`]; one is chosen
    /// uniformly at random per image.
    pub backgrounds: Vec<String>,
    /// Bold font for the "Welcome to {server}" line.
    pub bold_font: PathBuf,
    /// Light font for the member-name line.
    pub light_font: PathBuf,
    /// Fallback used when either primary font is unreadable.
    pub fallback_font: PathBuf,
}

impl Default for WelcomeConfig {
    fn default() -> Self {
        Self {
            background_dir: PathBuf::from("res/backgrounds"),
            backgrounds: ["road.jpg", "sky.jpg", "skyline.jpg"]
                .into_iter()
                .map(String::from)
                .collect(),
            bold_font: PathBuf::from("res/fonts/Poppins-Bold.ttf"),
            light_font: PathBuf::from("res/fonts/Poppins-Light.ttf"),
            fallback_font: PathBuf::from("res/fonts/DejaVuSans.ttf"),
        }
    }
}

/// Loads the application configuration from the process environment.
///
/// # Errors
/// Currently infallible in practice (every variable is optional), but kept
/// fallible so future required settings slot in without changing `main`.
pub fn load_app_configuration() -> Result<AppConfig> {
    Ok(AppConfig::from_lookup(|key| std::env::var(key).ok()))
}

impl AppConfig {
    /// Builds a configuration from an arbitrary key lookup, so tests don't
    /// have to mutate the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let status_text = lookup("DISCORD_BOT_STATUS").unwrap_or_else(|| {
            info!("DISCORD_BOT_STATUS not set, using default '{DEFAULT_STATUS}'");
            DEFAULT_STATUS.to_string()
        });

        let log_channel_id = match lookup("LOG_CHANNEL_ID") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(
                        "Invalid LOG_CHANNEL_ID '{raw}': must be a numeric channel id. \
                         Server-event logging disabled."
                    );
                    None
                }
            },
            None => {
                warn!("LOG_CHANNEL_ID not set. Server-event logging disabled.");
                None
            }
        };

        let weather_api_key = lookup("WEATHER_API_KEY");
        if weather_api_key.is_none() {
            warn!("WEATHER_API_KEY not set. The /weather command will not function.");
        }

        let analytics = match (
            lookup("SLOWSTATS_COMMANDER_API_KEY"),
            lookup("SLOWSTATS_COMMANDER_PROJECT_ID"),
        ) {
            (Some(api_key), Some(project_id)) => Some(AnalyticsConfig {
                api_key,
                project_id,
                webhook_url: lookup("DISCORD_WEBHOOK_URL"),
            }),
            (None, None) => None,
            _ => {
                warn!(
                    "Analytics requires both SLOWSTATS_COMMANDER_API_KEY and \
                     SLOWSTATS_COMMANDER_PROJECT_ID; only one is set. Analytics disabled."
                );
                None
            }
        };

        let mut welcome = WelcomeConfig::default();
        if let Some(dir) = lookup("WELCOME_BACKGROUND_DIR") {
            welcome.background_dir = PathBuf::from(dir);
        }

        Self {
            status_text,
            log_channel_id,
            weather_api_key,
            analytics,
            welcome,
        }
    }
}
