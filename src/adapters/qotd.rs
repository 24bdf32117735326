//! ZenQuotes quote-of-the-day adapter. The upstream responds with a
//! one-element JSON array.

use crate::adapters::get_json;
use crate::errors::{Error, Result};
use serde::Deserialize;
use tracing::info;

const QOTD_URL: &str = "https://zenquotes.io/api/today";

#[derive(Debug, Deserialize)]
struct Quote {
    q: Option<String>,
    a: Option<String>,
}

/// Fetches the quote of the day, formatted as a Markdown block quote.
pub async fn fetch_qotd(client: &reqwest::Client) -> Result<String> {
    let data: Vec<Quote> = get_json(client, QOTD_URL, &[]).await?;
    let formatted = qotd_from_response(data)?;
    info!("successfully fetched quote of the day");
    Ok(formatted)
}

fn qotd_from_response(data: Vec<Quote>) -> Result<String> {
    let quote = data
        .into_iter()
        .next()
        .ok_or_else(|| Error::Shape("quote payload is an empty array".into()))?;
    match (quote.q, quote.a) {
        (Some(text), Some(author)) => Ok(format!("> {text}\n> \n> *- {author}*")),
        _ => Err(Error::Shape(
            "quote payload missing `q` or `a` field".into(),
        )),
    }
}
