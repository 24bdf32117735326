//! Bored API random-activity adapter.

use crate::adapters::get_json;
use crate::errors::{Error, Result};
use serde::Deserialize;
use tracing::info;

const ACTIVITY_URL: &str = "https://bored-api.appbrewery.com/random";

#[derive(Debug, Deserialize)]
struct ActivityResponse {
    activity: Option<String>,
}

/// Fetches one random activity suggestion.
pub async fn fetch_activity(client: &reqwest::Client) -> Result<String> {
    let data: ActivityResponse = get_json(client, ACTIVITY_URL, &[]).await?;
    let activity = data
        .activity
        .ok_or_else(|| Error::Shape("activity payload missing `activity` field".into()))?;
    info!(activity, "successfully fetched activity");
    Ok(activity)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_activity_field_deserializes() {
        let data: ActivityResponse =
            serde_json::from_value(serde_json::json!({ "activity": "Learn origami" })).unwrap();
        assert_eq!(data.activity.as_deref(), Some("Learn origami"));
    }

    #[test]
    fn test_missing_activity_field_is_none() {
        let data: ActivityResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(data.activity.is_none());
    }
}
