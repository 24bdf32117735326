//! REST adapters - one module per upstream API.
//!
//! Each adapter issues a single GET (the cocktail adapter repeats it, capped),
//! validates the JSON shape, and maps it into a display string or a
//! [`crate::embeds::LogEmbed`]. Adapters are stateless and independent; the
//! only shared code is the request helper below.

/// Bored API random activities
pub mod activity;
/// TheCocktailDB random drinks
pub mod cocktail;
/// Eightball readings
pub mod eightball;
/// JokeAPI single jokes
pub mod joke;
/// meme-api random memes
pub mod meme;
/// ZenQuotes quote of the day
pub mod qotd;
/// OpenWeatherMap current weather
pub mod weather;

use crate::errors::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

/// Bounded timeout for every adapter request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Issues one GET and decodes the JSON body.
///
/// Any non-2xx status, non-JSON content type, transport failure, or timeout
/// becomes an error; callers that need finer status mapping (weather) issue
/// the request themselves.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T> {
    debug!(url, "issuing upstream request");
    let response = client
        .get(url)
        .query(query)
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        error!(url, %status, "upstream returned an error status");
        return Err(Error::UpstreamStatus { status });
    }

    expect_json_content_type(&response, url)?;
    Ok(response.json::<T>().await?)
}

/// Rejects 2xx responses whose content type is not JSON.
pub(crate) fn expect_json_content_type(response: &reqwest::Response, url: &str) -> Result<()> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if content_type.contains("application/json") {
        Ok(())
    } else {
        error!(url, content_type, "non-JSON response from upstream");
        Err(Error::UnexpectedContentType(content_type.to_string()))
    }
}
