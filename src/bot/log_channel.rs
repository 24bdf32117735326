//! Lazily-resolved, resolve-at-most-once cache for the server-activity log
//! channel.
//!
//! The first event that needs the channel performs the lookup; every later
//! event reuses the result. A channel that is missing, forbidden, or not a
//! guild text channel disables server-event logging for the remainder of the
//! process, reported once rather than on every event. Transient lookup
//! failures leave the cache unresolved so a later event can retry.

use crate::embeds::LogEmbed;
use poise::serenity_prelude as serenity;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheState {
    Unresolved,
    Ready(serenity::ChannelId),
    Disabled,
}

/// What one lookup attempt learned about the configured channel.
#[derive(Debug, Clone, Copy)]
enum LookupOutcome {
    TextChannel(serenity::ChannelId),
    WrongType,
    NotFound,
    Forbidden,
    Transient,
}

/// Shared handle to the log channel. The mutex is held across the first
/// lookup so concurrent events cannot race the resolution.
#[derive(Debug)]
pub struct LogChannelCache {
    configured: Option<serenity::ChannelId>,
    state: Mutex<CacheState>,
}

impl LogChannelCache {
    pub fn new(channel_id: Option<u64>) -> Self {
        let state = if channel_id.is_some() {
            CacheState::Unresolved
        } else {
            // reported at config-load time, stays silent here
            CacheState::Disabled
        };
        Self {
            configured: channel_id.map(serenity::ChannelId::new),
            state: Mutex::new(state),
        }
    }

    /// Sends `embed` to the log channel, if logging is (still) enabled.
    pub async fn send(&self, ctx: &serenity::Context, embed: LogEmbed) {
        let Some(channel) = self.resolve(ctx).await else {
            return;
        };
        let message = serenity::CreateMessage::new().embed(embed.render());
        if let Err(err) = channel.send_message(&ctx.http, message).await {
            if is_permission_error(&err) {
                error!(
                    %err,
                    "lost permission to post in the log channel; disabling server-event logging"
                );
                *self.state.lock().await = CacheState::Disabled;
            } else {
                warn!(%err, "failed to send log embed");
            }
        }
    }

    async fn resolve(&self, ctx: &serenity::Context) -> Option<serenity::ChannelId> {
        let mut state = self.state.lock().await;
        match *state {
            CacheState::Ready(id) => return Some(id),
            CacheState::Disabled => return None,
            CacheState::Unresolved => {}
        }
        let configured = self.configured?;

        let outcome = match ctx.http.get_channel(configured).await {
            Ok(serenity::Channel::Guild(channel))
                if channel.kind == serenity::ChannelType::Text =>
            {
                LookupOutcome::TextChannel(channel.id)
            }
            Ok(_) => LookupOutcome::WrongType,
            Err(err) => classify_lookup_error(&err),
        };
        transition(&mut state, configured, outcome)
    }
}

/// Applies one lookup outcome to the cache state, logging each terminal
/// condition exactly once.
fn transition(
    state: &mut CacheState,
    configured: serenity::ChannelId,
    outcome: LookupOutcome,
) -> Option<serenity::ChannelId> {
    match outcome {
        LookupOutcome::TextChannel(id) => {
            info!(channel = %id, "resolved server-event log channel");
            *state = CacheState::Ready(id);
            Some(id)
        }
        LookupOutcome::WrongType => {
            error!(
                channel = %configured,
                "configured log channel is not a guild text channel; server-event logging disabled"
            );
            *state = CacheState::Disabled;
            None
        }
        LookupOutcome::NotFound => {
            error!(
                channel = %configured,
                "configured log channel was not found; server-event logging disabled"
            );
            *state = CacheState::Disabled;
            None
        }
        LookupOutcome::Forbidden => {
            error!(
                channel = %configured,
                "bot lacks permission to fetch the log channel; server-event logging disabled"
            );
            *state = CacheState::Disabled;
            None
        }
        LookupOutcome::Transient => {
            warn!(
                channel = %configured,
                "transient failure resolving the log channel; will retry on the next event"
            );
            None
        }
    }
}

fn classify_lookup_error(err: &serenity::Error) -> LookupOutcome {
    match err {
        serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response)) => {
            match response.status_code.as_u16() {
                404 => LookupOutcome::NotFound,
                403 => LookupOutcome::Forbidden,
                _ => LookupOutcome::Transient,
            }
        }
        _ => LookupOutcome::Transient,
    }
}

fn is_permission_error(err: &serenity::Error) -> bool {
    matches!(
        err,
        serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 403
    )
}
