//! One explicit display-object type for everything the bot posts as an embed,
//! plus the formatting helpers shared by adapters and event listeners.
//!
//! Every adapter and listener builds a [`LogEmbed`] and a single renderer
//! turns it into the platform's message format, instead of each call site
//! assembling ad-hoc embed builders.

use chrono::{DateTime, Datelike, Utc};
use poise::serenity_prelude as serenity;

/// Discord caps embed field values at 1024 characters.
pub const FIELD_LIMIT: usize = 1024;

/// Embed accent colors used across the bot.
pub mod colors {
    /// Weather embeds.
    pub const PURPLE: u32 = 0x0080_0080;
    /// Cocktail embeds.
    pub const ORCHID: u32 = 0x00DA_70D6;
    /// Member joined / voice join.
    pub const GREEN: u32 = 0x0056_FF00;
    /// Message deleted / voice leave.
    pub const RED: u32 = 0x00FF_0000;
    /// Member left.
    pub const DARK_RED: u32 = 0x0099_2D22;
    /// Message edited.
    pub const ORANGE: u32 = 0x00FF_BF00;
    /// Voice channel switch.
    pub const BLUE: u32 = 0x0034_98DB;
    /// Profile (nickname/username/avatar) changes.
    pub const MAGENTA: u32 = 0x00FF_00EF;
}

/// A structured, platform-agnostic embed: title, description, color,
/// author, thumbnail, field list, footer.
#[derive(Debug, Clone, Default)]
pub struct LogEmbed {
    pub title: String,
    pub description: Option<String>,
    pub color: u32,
    /// Author line: name plus optional icon URL.
    pub author: Option<(String, Option<String>)>,
    pub thumbnail: Option<String>,
    /// `(name, value, inline)` triples, in display order.
    pub fields: Vec<(String, String, bool)>,
    pub footer: Option<String>,
}

impl LogEmbed {
    /// Starts an embed with the two fields every embed has.
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            color,
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn author(mut self, name: impl Into<String>, icon_url: Option<String>) -> Self {
        self.author = Some((name.into(), icon_url));
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    /// Appends a field, clamping the value to Discord's field-length limit.
    pub fn field(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        inline: bool,
    ) -> Self {
        self.fields
            .push((name.into(), truncate_field(&value.into()), inline));
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Renders into the platform's embed builder.
    pub fn render(&self) -> serenity::CreateEmbed {
        let mut embed = serenity::CreateEmbed::new()
            .title(self.title.clone())
            .colour(serenity::Colour::new(self.color));
        if let Some(description) = &self.description {
            embed = embed.description(description.clone());
        }
        if let Some((name, icon_url)) = &self.author {
            let mut author = serenity::CreateEmbedAuthor::new(name.clone());
            if let Some(url) = icon_url {
                author = author.icon_url(url.clone());
            }
            embed = embed.author(author);
        }
        if let Some(url) = &self.thumbnail {
            embed = embed.thumbnail(url.clone());
        }
        for (name, value, inline) in &self.fields {
            embed = embed.field(name.clone(), value.clone(), *inline);
        }
        if let Some(footer) = &self.footer {
            embed = embed.footer(serenity::CreateEmbedFooter::new(footer.clone()));
        }
        embed
    }
}

/// Clamps text to [`FIELD_LIMIT`] characters with a visible truncation
/// marker, never splitting a multi-byte character.
pub fn truncate_field(text: &str) -> String {
    if text.chars().count() <= FIELD_LIMIT {
        return text.to_string();
    }
    let mut out: String = text.chars().take(FIELD_LIMIT - 1).collect();
    out.push('…');
    out
}

/// Converts an integer to its ordinal representation (1 -> "1st").
pub fn ordinal(n: u32) -> String {
    let suffix = match n % 100 {
        11..=13 => "th",
        _ => match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    };
    format!("{n}{suffix}")
}

/// Shared footer timestamp, e.g. "Friday, August 28th 2026, at 04:05 PM UTC".
pub fn footer_timestamp(now: DateTime<Utc>) -> String {
    format!(
        "{}{} {}",
        now.format("%A, %B "),
        ordinal(now.day()),
        now.format("%Y, at %I:%M %p UTC")
    )
}

/// Rough human description of a duration, largest sensible unit only.
pub fn approximate_age(duration: chrono::Duration) -> String {
    if duration.num_days() > 1 {
        format!("{} days", duration.num_days())
    } else if duration.num_days() == 1 {
        "1 day".to_string()
    } else if duration.num_hours() >= 1 {
        format!("{} hours", duration.num_hours())
    } else if duration.num_minutes() >= 1 {
        format!("{} minutes", duration.num_minutes())
    } else {
        format!("{} seconds", duration.num_seconds().max(0))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_ordinal_suffixes() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(13), "13th");
        assert_eq!(ordinal(21), "21st");
        assert_eq!(ordinal(111), "111th");
    }

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate_field("hello"), "hello");
    }

    #[test]
    fn test_truncate_long_text_gets_marker() {
        let long = "a".repeat(FIELD_LIMIT + 50);
        let truncated = truncate_field(&long);
        assert_eq!(truncated.chars().count(), FIELD_LIMIT);
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn test_truncate_is_char_boundary_safe() {
        let long = "é".repeat(FIELD_LIMIT + 1);
        let truncated = truncate_field(&long);
        assert_eq!(truncated.chars().count(), FIELD_LIMIT);
    }

    #[test]
    fn test_footer_timestamp_contains_ordinal_day() {
        let when = Utc.with_ymd_and_hms(2025, 3, 2, 16, 5, 0).unwrap();
        let stamp = footer_timestamp(when);
        assert_eq!(stamp, "Sunday, March 2nd 2025, at 04:05 PM UTC");
    }

    #[test]
    fn test_approximate_age_units() {
        assert_eq!(approximate_age(chrono::Duration::days(10)), "10 days");
        assert_eq!(approximate_age(chrono::Duration::days(1)), "1 day");
        assert_eq!(approximate_age(chrono::Duration::hours(5)), "5 hours");
        assert_eq!(approximate_age(chrono::Duration::minutes(3)), "3 minutes");
        assert_eq!(approximate_age(chrono::Duration::seconds(42)), "42 seconds");
    }

    #[test]
    fn test_field_values_are_clamped() {
        let embed = LogEmbed::new("t", colors::RED).field("Before:", "x".repeat(2000), false);
        assert_eq!(embed.fields[0].1.chars().count(), FIELD_LIMIT);
    }

    #[test]
    fn test_embed_builder_accumulates() {
        let embed = LogEmbed::new("Weather in Toronto", colors::PURPLE)
            .description("desc")
            .thumbnail("https://flagsapi.com/CA/flat/64.png")
            .field("High", "23°C", true)
            .footer("Data provided by OpenWeatherMap");
        assert_eq!(embed.fields.len(), 1);
        assert!(embed.thumbnail.as_deref().unwrap().contains("CA"));
        // render() should not panic on a fully-populated embed
        let _ = embed.render();
    }
}
