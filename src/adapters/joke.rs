//! JokeAPI single-joke adapter.
//!
//! Racist and sexist jokes are blacklisted at the source via query flags.

use crate::adapters::get_json;
use crate::errors::{Error, Result};
use serde::Deserialize;
use tracing::info;

const JOKE_URL: &str = "https://v2.jokeapi.dev/joke/Any";

#[derive(Debug, Deserialize)]
struct JokeResponse {
    error: Option<bool>,
    joke: Option<String>,
    message: Option<String>,
}

/// Fetches one single-format SFW-ish joke.
pub async fn fetch_joke(client: &reqwest::Client) -> Result<String> {
    let data: JokeResponse = get_json(
        client,
        JOKE_URL,
        &[("blacklistFlags", "racist,sexist"), ("type", "single")],
    )
    .await?;
    let joke = joke_from_response(data)?;
    info!("successfully fetched joke");
    Ok(joke)
}

fn joke_from_response(data: JokeResponse) -> Result<String> {
    if data.error == Some(true) {
        return Err(Error::Shape(format!(
            "JokeAPI returned an error: {}",
            data.message.as_deref().unwrap_or("no message")
        )));
    }
    data.joke
        .ok_or_else(|| Error::Shape("joke payload missing `joke` field".into()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_single_joke_is_extracted() {
        let data: JokeResponse = serde_json::from_value(serde_json::json!({
            "error": false,
            "joke": "Why do programmers prefer dark mode? Because light attracts bugs."
        }))
        .unwrap();
        assert!(joke_from_response(data).unwrap().contains("dark mode"));
    }

    #[test]
    fn test_explicit_error_flag_is_a_shape_error() {
        let data: JokeResponse = serde_json::from_value(serde_json::json!({
            "error": true,
            "message": "No jokes found"
        }))
        .unwrap();
        assert!(matches!(joke_from_response(data), Err(Error::Shape(_))));
    }

    #[test]
    fn test_missing_joke_field_is_a_shape_error() {
        let data: JokeResponse =
            serde_json::from_value(serde_json::json!({ "error": false })).unwrap();
        assert!(matches!(joke_from_response(data), Err(Error::Shape(_))));
    }
}
