//! Gateway event listeners.
//!
//! One stateless reaction per event: the welcome flow on member join, and a
//! server-activity embed for message edits/deletes, joins/leaves, voice
//! movement, and profile changes. The decision rules (what counts as a change
//! worth logging) are split into pure functions so they stay testable without
//! a gateway connection. Bot-authored events are filtered everywhere.

use crate::bot::{Data, Error};
use crate::embeds::{self, colors, LogEmbed, FIELD_LIMIT};
use crate::welcome;
use chrono::{DateTime, Datelike, Utc};
use poise::serenity_prelude as serenity;
use serenity::Mentionable;
use tracing::{debug, error, info, warn};

/// Dispatches raw gateway events to the individual listeners.
///
/// # Errors
/// Listener failures are contained and logged; this only fails if an error
/// escapes the dispatch itself.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(
                user = %data_about_bot.user.name,
                guilds = data_about_bot.guilds.len(),
                "connected to the gateway"
            );
            ctx.set_activity(Some(serenity::ActivityData::watching(
                data.config.status_text.clone(),
            )));
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            member_joined(ctx, data, new_member).await;
        }
        serenity::FullEvent::GuildMemberRemoval {
            guild_id,
            user,
            member_data_if_available,
        } => {
            member_left(ctx, data, *guild_id, user, member_data_if_available.as_ref()).await;
        }
        serenity::FullEvent::MessageUpdate {
            old_if_available,
            new,
            event,
        } => {
            message_edited(ctx, data, old_if_available.as_ref(), new.as_ref(), event).await;
        }
        serenity::FullEvent::MessageDelete {
            channel_id,
            deleted_message_id,
            ..
        } => {
            message_deleted(ctx, data, *channel_id, *deleted_message_id).await;
        }
        serenity::FullEvent::VoiceStateUpdate { old, new } => {
            voice_state_changed(ctx, data, old.as_ref(), new).await;
        }
        serenity::FullEvent::GuildMemberUpdate {
            old_if_available,
            new,
            ..
        } => {
            if let (Some(before), Some(after)) = (old_if_available, new) {
                member_profile_changed(ctx, data, before, after).await;
            }
        }
        _ => {}
    }
    Ok(())
}

async fn member_joined(ctx: &serenity::Context, data: &Data, member: &serenity::Member) {
    if member.user.bot {
        return;
    }
    info!(member = %member.user.name, guild = %member.guild_id, "member joined");

    send_welcome(ctx, data, member).await;

    let created = member.user.created_at().to_utc();
    let member_count = ctx.cache.guild(member.guild_id).map(|guild| guild.member_count);
    let embed = LogEmbed::new("Member Joined", colors::GREEN)
        .description(format!("{} {}", member.mention(), member.user.name))
        .field(
            "Account Details",
            format!(
                "Created: {}\nAge: ~{}",
                month_day_year(created),
                embeds::approximate_age(Utc::now() - created)
            ),
            true,
        )
        .field(
            "Member Count",
            member_count.map_or_else(|| "Unknown".to_string(), |count| count.to_string()),
            true,
        )
        .thumbnail(member.face())
        .footer(event_footer(member.user.id.get()));
    data.log_channel.send(ctx, embed).await;
}

/// Best-effort welcome message in the guild's system channel. Failures here
/// never suppress the join log embed.
async fn send_welcome(ctx: &serenity::Context, data: &Data, member: &serenity::Member) {
    let guild = match member.guild_id.to_partial_guild(&ctx.http).await {
        Ok(guild) => guild,
        Err(err) => {
            warn!(%err, guild = %member.guild_id, "could not fetch guild for welcome message");
            return;
        }
    };
    let Some(system_channel) = guild.system_channel_id else {
        info!(guild = %guild.name, "guild has no system channel, skipping welcome message");
        return;
    };

    let image = match welcome::generate(
        &data.http,
        &data.config.welcome,
        &member.face(),
        member.display_name(),
        &guild.name,
    )
    .await
    {
        Ok(image) => image,
        Err(err) => {
            error!(%err, member = %member.user.name, "failed to generate welcome image");
            return;
        }
    };

    let message = serenity::CreateMessage::new()
        .content(format!("Welcome {}!", member.mention()))
        .add_file(serenity::CreateAttachment::bytes(image, "welcome.png"));
    if let Err(err) = system_channel.send_message(&ctx.http, message).await {
        error!(%err, guild = %guild.name, "failed to send welcome message");
    }
}

async fn member_left(
    ctx: &serenity::Context,
    data: &Data,
    guild_id: serenity::GuildId,
    user: &serenity::User,
    member: Option<&serenity::Member>,
) {
    if user.bot {
        return;
    }
    info!(member = %user.name, guild = %guild_id, "member left");

    let joined_value = match member.and_then(|m| m.joined_at).map(|t| t.to_utc()) {
        Some(joined_at) => format!(
            "{}\nDuration: {}",
            month_day_year(joined_at),
            embeds::approximate_age(Utc::now() - joined_at)
        ),
        None => "Unknown".to_string(),
    };

    let embed = LogEmbed::new("Member Left", colors::DARK_RED)
        .description(format!("{} {}", user.mention(), user.name))
        .field("Joined On", joined_value, false)
        .thumbnail(user.face())
        .footer(event_footer(user.id.get()));
    data.log_channel.send(ctx, embed).await;
}

async fn message_edited(
    ctx: &serenity::Context,
    data: &Data,
    old: Option<&serenity::Message>,
    new: Option<&serenity::Message>,
    event: &serenity::MessageUpdateEvent,
) {
    // Embed-only updates (link previews etc.) carry no usable message body.
    let Some(new) = new else {
        debug!(message = %event.id, "edited message not materialized, skipping");
        return;
    };
    if new.author.bot {
        return;
    }
    let Some((before_field, after_field)) =
        edited_message_fields(old.map(|m| m.content.as_str()), &new.content)
    else {
        return;
    };

    let channel_name = channel_display_name(ctx, new.channel_id).await;
    let embed = LogEmbed::new(format!("Message Edited in #{channel_name}"), colors::ORANGE)
        .description(format!("[Jump to Message]({})", new.link()))
        .author(new.author.tag(), Some(new.author.face()))
        .field("Before:", before_field, false)
        .field("After:", after_field, false)
        .footer(message_footer(new.author.id.get(), new.id.get()));
    data.log_channel.send(ctx, embed).await;
    debug!(author = %new.author.name, "logged message edit");
}

/// Everything worth keeping from a deleted message, cloned out of the cache
/// before any await point.
struct DeletedMessage {
    author_tag: String,
    author_icon: String,
    author_id: u64,
    author_is_bot: bool,
    content: String,
    attachments: Vec<(String, u64)>,
}

async fn message_deleted(
    ctx: &serenity::Context,
    data: &Data,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
) {
    let cached = ctx
        .cache
        .message(channel_id, message_id)
        .map(|message| DeletedMessage {
            author_tag: message.author.tag(),
            author_icon: message.author.face(),
            author_id: message.author.id.get(),
            author_is_bot: message.author.bot,
            content: message.content.clone(),
            attachments: message
                .attachments
                .iter()
                .map(|attachment| (attachment.filename.clone(), u64::from(attachment.size)))
                .collect(),
        });
    if cached.as_ref().is_some_and(|m| m.author_is_bot) {
        return;
    }

    let channel_name = channel_display_name(ctx, channel_id).await;
    let mut embed = LogEmbed::new(format!("Message Deleted in #{channel_name}"), colors::RED)
        .field(
            "Deleted Message:",
            cached.as_ref().map_or_else(
                || "`[Message not cached]`".to_string(),
                |m| fenced_content(&m.content),
            ),
            false,
        );

    if let Some(message) = &cached {
        embed = embed.author(message.author_tag.clone(), Some(message.author_icon.clone()));
        if !message.attachments.is_empty() {
            embed = embed.field("Attachments:", attachment_list(&message.attachments), false);
        }
        embed = embed.footer(message_footer(message.author_id, message_id.get()));
    } else {
        embed = embed.footer(format!(
            "Msg ID: {} | {}",
            message_id.get(),
            embeds::footer_timestamp(Utc::now())
        ));
    }
    data.log_channel.send(ctx, embed).await;
}

async fn voice_state_changed(
    ctx: &serenity::Context,
    data: &Data,
    old: Option<&serenity::VoiceState>,
    new: &serenity::VoiceState,
) {
    if new.member.as_ref().is_some_and(|m| m.user.bot) {
        return;
    }
    let Some(transition) = voice_transition(old.and_then(|s| s.channel_id), new.channel_id)
    else {
        return;
    };

    let mention = new.user_id.mention();
    let (title, description, color) = match transition {
        VoiceTransition::Joined(to) => (
            "Member Joined Voice Channel",
            format!("{mention} joined **#{}**", channel_display_name(ctx, to).await),
            colors::GREEN,
        ),
        VoiceTransition::Left(from) => (
            "Member Left Voice Channel",
            format!("{mention} left **#{}**", channel_display_name(ctx, from).await),
            colors::RED,
        ),
        VoiceTransition::Moved { from, to } => (
            "Member Switched Voice Channel",
            format!(
                "{mention} moved from **#{}** to **#{}**",
                channel_display_name(ctx, from).await,
                channel_display_name(ctx, to).await
            ),
            colors::BLUE,
        ),
    };

    let mut embed = LogEmbed::new(title, color)
        .description(description)
        .footer(event_footer(new.user_id.get()));
    if let Some(member) = &new.member {
        embed = embed.author(member.user.tag(), Some(member.face()));
    }
    data.log_channel.send(ctx, embed).await;
}

async fn member_profile_changed(
    ctx: &serenity::Context,
    data: &Data,
    before: &serenity::Member,
    after: &serenity::Member,
) {
    if after.user.bot {
        return;
    }
    let Some(change) = profile_change(&snapshot(before), &snapshot(after)) else {
        return;
    };

    let embed = match change {
        ProfileChange::Username {
            before: old_name,
            after: new_name,
        } => LogEmbed::new("Username Changed", colors::MAGENTA)
            .author(after.user.tag(), Some(after.face()))
            .field("Before:", format!("`{old_name}`"), false)
            .field("After:", format!("`{new_name}`"), false)
            .thumbnail(after.face()),
        ProfileChange::Nickname {
            before: old_nick,
            after: new_nick,
        } => LogEmbed::new("Nickname Changed", colors::MAGENTA)
            .author(after.user.tag(), Some(after.face()))
            .field("Before:", format!("`{old_nick}`"), false)
            .field("After:", format!("`{new_nick}`"), false)
            .thumbnail(after.face()),
        ProfileChange::Avatar => LogEmbed::new("Avatar Changed", colors::MAGENTA)
            .author(after.user.tag(), Some(before.face()))
            .thumbnail(after.face()),
    };
    data.log_channel
        .send(ctx, embed.footer(event_footer(after.user.id.get())))
        .await;
    debug!(user = %after.user.name, "logged profile change");
}

async fn channel_display_name(ctx: &serenity::Context, channel_id: serenity::ChannelId) -> String {
    channel_id
        .name(ctx)
        .await
        .unwrap_or_else(|_| "unknown-channel".to_string())
}

fn event_footer(id: u64) -> String {
    format!("ID: {id} | {}", embeds::footer_timestamp(Utc::now()))
}

fn message_footer(author_id: u64, message_id: u64) -> String {
    format!(
        "User ID: {author_id} | Msg ID: {message_id} | {}",
        embeds::footer_timestamp(Utc::now())
    )
}

/// "March 2nd 2025" style dates used in join/leave embeds.
fn month_day_year(when: DateTime<Utc>) -> String {
    format!(
        "{}{} {}",
        when.format("%B "),
        embeds::ordinal(when.day()),
        when.format("%Y")
    )
}

/// Renders message content for an embed field, code-fenced and clipped early
/// enough that the closing fence survives the field limit.
fn fenced_content(content: &str) -> String {
    if content.is_empty() {
        return "`[Empty Message]`".to_string();
    }
    let budget = FIELD_LIMIT - 8;
    if content.chars().count() > budget {
        let mut clipped: String = content.chars().take(budget - 1).collect();
        clipped.push('…');
        format!("```{clipped}```")
    } else {
        format!("```{content}```")
    }
}

/// Before/After field values for an edit, or `None` when there is nothing
/// worth logging (content unchanged).
fn edited_message_fields(before: Option<&str>, after: &str) -> Option<(String, String)> {
    if before == Some(after) {
        return None;
    }
    let before_field = match before {
        Some(text) => fenced_content(text),
        None => "`[Not cached]`".to_string(),
    };
    Some((before_field, fenced_content(after)))
}

/// One "- name (size KB)" line per attachment, capped to the field limit.
fn attachment_list(attachments: &[(String, u64)]) -> String {
    let mut listing = String::new();
    for (filename, size) in attachments {
        let line = format!("- {filename} ({} KB)\n", size / 1024);
        if listing.chars().count() + line.chars().count() > FIELD_LIMIT - 4 {
            listing.push('…');
            break;
        }
        listing.push_str(&line);
    }
    listing.trim_end().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VoiceTransition {
    Joined(serenity::ChannelId),
    Left(serenity::ChannelId),
    Moved {
        from: serenity::ChannelId,
        to: serenity::ChannelId,
    },
}

/// Classifies a voice-state pair. Mute/deafen toggles and other same-channel
/// updates produce nothing.
fn voice_transition(
    before: Option<serenity::ChannelId>,
    after: Option<serenity::ChannelId>,
) -> Option<VoiceTransition> {
    match (before, after) {
        (None, Some(to)) => Some(VoiceTransition::Joined(to)),
        (Some(from), None) => Some(VoiceTransition::Left(from)),
        (Some(from), Some(to)) if from != to => Some(VoiceTransition::Moved { from, to }),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ProfileSnapshot {
    username: String,
    nickname: Option<String>,
    avatar_url: String,
}

fn snapshot(member: &serenity::Member) -> ProfileSnapshot {
    ProfileSnapshot {
        username: member.user.name.clone(),
        nickname: member.nick.clone(),
        avatar_url: member.face(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ProfileChange {
    Username { before: String, after: String },
    Nickname { before: String, after: String },
    Avatar,
}

/// Picks the single most significant profile difference, username first.
fn profile_change(before: &ProfileSnapshot, after: &ProfileSnapshot) -> Option<ProfileChange> {
    if before.username != after.username {
        return Some(ProfileChange::Username {
            before: before.username.clone(),
            after: after.username.clone(),
        });
    }
    if before.nickname != after.nickname {
        return Some(ProfileChange::Nickname {
            before: before.nickname.clone().unwrap_or_else(|| "[None]".to_string()),
            after: after.nickname.clone().unwrap_or_else(|| "[None]".to_string()),
        });
    }
    if before.avatar_url != after.avatar_url {
        return Some(ProfileChange::Avatar);
    }
    None
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const VC_A: serenity::ChannelId = serenity::ChannelId::new(100);
    const VC_B: serenity::ChannelId = serenity::ChannelId::new(200);

    fn profile(username: &str, nickname: Option<&str>, avatar: &str) -> ProfileSnapshot {
        ProfileSnapshot {
            username: username.to_string(),
            nickname: nickname.map(str::to_string),
            avatar_url: avatar.to_string(),
        }
    }

    #[test]
    fn test_identical_edit_is_suppressed_every_time() {
        // a redelivered update with unchanged content must stay silent
        for _ in 0..3 {
            assert!(edited_message_fields(Some("same"), "same").is_none());
        }
    }

    #[test]
    fn test_changed_edit_produces_both_fields() {
        let (before, after) = edited_message_fields(Some("old"), "new").unwrap();
        assert_eq!(before, "```old```");
        assert_eq!(after, "```new```");
    }

    #[test]
    fn test_uncached_before_gets_placeholder() {
        let (before, after) = edited_message_fields(None, "new").unwrap();
        assert_eq!(before, "`[Not cached]`");
        assert_eq!(after, "```new```");
    }

    #[test]
    fn test_empty_content_renders_placeholder() {
        assert_eq!(fenced_content(""), "`[Empty Message]`");
    }

    #[test]
    fn test_fenced_content_stays_within_field_limit() {
        let long = "x".repeat(3000);
        let fenced = fenced_content(&long);
        assert!(fenced.chars().count() <= FIELD_LIMIT);
        assert!(fenced.starts_with("```"));
        assert!(fenced.ends_with("```"));
        assert!(fenced.contains('…'));
    }

    #[test]
    fn test_voice_join_leave_and_move() {
        assert_eq!(
            voice_transition(None, Some(VC_A)),
            Some(VoiceTransition::Joined(VC_A))
        );
        assert_eq!(
            voice_transition(Some(VC_A), None),
            Some(VoiceTransition::Left(VC_A))
        );
        assert_eq!(
            voice_transition(Some(VC_A), Some(VC_B)),
            Some(VoiceTransition::Moved { from: VC_A, to: VC_B })
        );
    }

    #[test]
    fn test_mute_only_voice_update_is_silent() {
        assert_eq!(voice_transition(Some(VC_A), Some(VC_A)), None);
        assert_eq!(voice_transition(None, None), None);
    }

    #[test]
    fn test_profile_username_change_wins_over_others() {
        let before = profile("old", Some("nick"), "a.png");
        let after = profile("new", Some("other"), "b.png");
        assert_eq!(
            profile_change(&before, &after),
            Some(ProfileChange::Username {
                before: "old".to_string(),
                after: "new".to_string(),
            })
        );
    }

    #[test]
    fn test_profile_nickname_change_formats_missing_as_none() {
        let before = profile("name", None, "a.png");
        let after = profile("name", Some("nick"), "a.png");
        assert_eq!(
            profile_change(&before, &after),
            Some(ProfileChange::Nickname {
                before: "[None]".to_string(),
                after: "nick".to_string(),
            })
        );
    }

    #[test]
    fn test_profile_avatar_change_detected() {
        let before = profile("name", None, "a.png");
        let after = profile("name", None, "b.png");
        assert_eq!(profile_change(&before, &after), Some(ProfileChange::Avatar));
    }

    #[test]
    fn test_unchanged_profile_is_silent() {
        let snap = profile("name", Some("nick"), "a.png");
        assert_eq!(profile_change(&snap, &snap), None);
    }

    #[test]
    fn test_attachment_list_formats_and_caps() {
        let few = vec![("photo.png".to_string(), 2048_u64)];
        assert_eq!(attachment_list(&few), "- photo.png (2 KB)");

        let many: Vec<(String, u64)> = (0..200)
            .map(|i| (format!("file-{i:03}.bin"), 4096))
            .collect();
        let listing = attachment_list(&many);
        assert!(listing.chars().count() <= FIELD_LIMIT);
        assert!(listing.ends_with('…'));
    }

    #[test]
    fn test_month_day_year_format() {
        use chrono::TimeZone;
        let when = Utc.with_ymd_and_hms(2024, 7, 21, 12, 0, 0).unwrap();
        assert_eq!(month_day_year(when), "July 21st 2024");
    }
}
