//! Unified error type for the bot.
//!
//! Adapter failures fall into two broad kinds: transport problems (`Http`,
//! `UpstreamStatus`, `UnexpectedContentType`) and semantic problems (`Shape`),
//! which are logged distinctly to help diagnose API contract drift. A couple
//! of upstream client errors with a known meaning get their own variants so
//! commands can map them to user-actionable messages.

use thiserror::Error;

/// All failure modes the bot knows how to report.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level failure: timeout, connection refused/reset, TLS, etc.
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream answered with a non-2xx status we have no mapping for.
    #[error("Upstream returned HTTP {status}")]
    UpstreamStatus { status: reqwest::StatusCode },

    #[error("Upstream returned non-JSON content type `{0}`")]
    UnexpectedContentType(String),

    /// 2xx response whose JSON is missing required fields or carries an
    /// explicit error flag.
    #[error("Unexpected upstream payload: {0}")]
    Shape(String),

    /// Weather upstream 404 - a user-input error, not a system error.
    #[error("City not found")]
    CityNotFound,

    /// Weather upstream 401 - an operator error.
    #[error("Weather API key rejected by upstream")]
    BadApiKey,

    /// The capped retry loop never saw an acceptable response.
    #[error("Upstream never returned a usable response within {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// Welcome-image pipeline failure, tagged with the stage that failed.
    #[error("Image generation failed at stage `{stage}`: {message}")]
    Image {
        stage: &'static str,
        message: String,
    },

    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Error::Framework(Box::new(value))
    }
}

impl Error {
    /// Shorthand for building an [`Error::Image`] from any displayable cause.
    pub fn image(stage: &'static str, cause: impl std::fmt::Display) -> Self {
        Error::Image {
            stage,
            message: cause.to_string(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
