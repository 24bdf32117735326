//! Best-effort usage analytics.
//!
//! The notifier fires one detached task per command invocation, POSTing an
//! event to the analytics ingest endpoint and optionally mirroring it to a
//! Discord-style webhook. It is invoked after the user-facing response has
//! been sent, never retries, and swallows every failure after logging it, so
//! the side channel is structurally incapable of affecting command results.

use crate::config::AnalyticsConfig;
use std::time::Duration;
use tracing::{debug, warn};

const EVENTS_URL: &str = "https://theslow.net/api/slowstats/ingest-events";

/// Short timeout so a slow telemetry endpoint cannot pile up tasks.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the analytics side channel. Cheap to clone; does nothing when
/// analytics is unconfigured.
#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,
    analytics: Option<AnalyticsConfig>,
}

impl Notifier {
    pub fn new(client: reqwest::Client, analytics: Option<AnalyticsConfig>) -> Self {
        Self { client, analytics }
    }

    /// Records one command invocation, fire-and-forget.
    pub fn command_used(
        &self,
        command: &str,
        user_id: u64,
        guild_id: Option<u64>,
        channel_id: u64,
    ) {
        let Some(config) = self.analytics.clone() else {
            return;
        };
        let client = self.client.clone();
        let command = command.to_string();

        tokio::spawn(async move {
            let mut body = serde_json::json!({
                "projectId": config.project_id,
                "eventType": "command_used",
                "description": format!("/{command} invoked"),
                "payload": {
                    "command": command,
                    "userId": user_id.to_string(),
                    "guildId": guild_id.map(|id| id.to_string()),
                    "channelId": channel_id.to_string(),
                },
            });
            if let Some(url) = &config.webhook_url {
                body["discordWebhook"] = serde_json::json!({
                    "url": url,
                    "title": sanitize(&format!("Command /{command} used")),
                });
            }

            let result = client
                .post(EVENTS_URL)
                .header("x-api-key", &config.api_key)
                .json(&body)
                .timeout(SEND_TIMEOUT)
                .send()
                .await;
            match result {
                Ok(response) if response.status().is_success() => {
                    debug!(command, "analytics event sent");
                }
                Ok(response) => {
                    warn!(command, status = %response.status(), "analytics event rejected");
                }
                Err(err) => {
                    warn!(command, %err, "failed to send analytics event");
                }
            }
        });
    }
}

/// Redacts mentions and channel sigils from webhook-visible text.
fn sanitize(text: &str) -> String {
    text.replace('@', "[redacted]").replace('#', "[redacted]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_redacts_mention_sigils() {
        assert_eq!(
            sanitize("ping @everyone in #general"),
            "ping [redacted]everyone in [redacted]general"
        );
    }

    #[test]
    fn test_sanitize_leaves_plain_text_alone() {
        assert_eq!(sanitize("Command /roll used"), "Command /roll used");
    }
}
