//! Eightball-reading adapter. The upstream accepts a `question` parameter but
//! ignores it server-side; it is forwarded anyway for log flavor.

use crate::adapters::get_json;
use crate::errors::{Error, Result};
use serde::Deserialize;
use tracing::info;

const EIGHTBALL_URL: &str = "https://eightballapi.com/api";

#[derive(Debug, Deserialize)]
struct ReadingResponse {
    reading: Option<String>,
}

/// Fetches a reading for `question`.
pub async fn fetch_reading(client: &reqwest::Client, question: &str) -> Result<String> {
    let data: ReadingResponse = get_json(
        client,
        EIGHTBALL_URL,
        &[("question", question), ("lucky", "true")],
    )
    .await?;
    let reading = data
        .reading
        .ok_or_else(|| Error::Shape("eightball payload missing `reading` field".into()))?;
    info!(reading, "successfully fetched eightball reading");
    Ok(reading)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_reading_field_deserializes() {
        let data: ReadingResponse =
            serde_json::from_value(serde_json::json!({ "reading": "Outlook good" })).unwrap();
        assert_eq!(data.reading.as_deref(), Some("Outlook good"));
    }

    #[test]
    fn test_missing_reading_field_is_none() {
        let data: ReadingResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(data.reading.is_none());
    }
}
