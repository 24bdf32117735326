//! meme-api random-meme adapter. NSFW-flagged results are never surfaced.

use crate::adapters::get_json;
use crate::errors::{Error, Result};
use serde::Deserialize;
use tracing::{info, warn};

const MEME_URL: &str = "https://meme-api.com/gimme";

#[derive(Debug, Deserialize)]
struct MemeResponse {
    url: Option<String>,
    nsfw: Option<bool>,
    title: Option<String>,
}

/// Fetches the image URL of one random, explicitly non-NSFW meme.
pub async fn fetch_meme_url(client: &reqwest::Client) -> Result<String> {
    let data: MemeResponse = get_json(client, MEME_URL, &[]).await?;
    let url = meme_url_from_response(data)?;
    info!(url, "successfully fetched meme");
    Ok(url)
}

fn meme_url_from_response(data: MemeResponse) -> Result<String> {
    // The flag must be present *and* false; an absent flag is treated as
    // unsafe rather than assumed clean.
    match data.nsfw {
        Some(false) => data
            .url
            .ok_or_else(|| Error::Shape("meme payload missing `url` field".into())),
        Some(true) => {
            warn!(title = ?data.title, "meme upstream returned NSFW content, rejecting");
            Err(Error::Shape("upstream returned an NSFW-flagged meme".into()))
        }
        None => Err(Error::Shape("meme payload missing `nsfw` flag".into())),
    }
}
