//! Fun commands - cocktails, eightball readings, jokes, memes, quotes,
//! activity suggestions, and a d6 roll. Every API-backed command defers first,
//! then answers with the adapter result or a short command-specific apology;
//! upstream error details stay in the process log.

use rand::Rng;

/// Rolls a single six-sided die.
fn roll_die() -> u8 {
    rand::rng().random_range(1..=6)
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::adapters::{activity, cocktail, eightball, joke, meme, qotd};
    use crate::bot::Context;
    use crate::errors::Result;
    use tracing::{error, info};

    /// Sends an ephemeral apology so the failure stays between the bot and
    /// the invoking user.
    async fn apologize(ctx: Context<'_>, message: &str) -> Result<()> {
        ctx.send(poise::CreateReply::default().content(message).ephemeral(true))
            .await?;
        Ok(())
    }

    /// Get a random cocktail suggestion.
    #[poise::command(slash_command)]
    pub async fn cocktail(ctx: Context<'_>) -> Result<()> {
        info!("Cocktail command received from user: {}", ctx.author().name);
        ctx.defer().await?;
        match cocktail::fetch_cocktail(&ctx.data().http).await {
            Ok(drink) => {
                ctx.send(poise::CreateReply::default().embed(drink.embed().render()))
                    .await?;
            }
            Err(err) => {
                error!(%err, "failed to fetch a cocktail");
                apologize(
                    ctx,
                    "Sorry, I couldn't mix a cocktail suggestion right now. Please try again later.",
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Ask the magic 8-ball a question!
    #[poise::command(slash_command)]
    pub async fn eightball(
        ctx: Context<'_>,
        #[description = "The yes/no question you want to ask."] question: String,
    ) -> Result<()> {
        info!(
            user = %ctx.author().name,
            question,
            "Eightball command received"
        );
        ctx.defer().await?;
        match eightball::fetch_reading(&ctx.data().http, &question).await {
            Ok(reading) => {
                ctx.say(format!(
                    "You asked: \"{question}\"\nThe Magic 8-Ball says: **{reading}**"
                ))
                .await?;
            }
            Err(err) => {
                error!(%err, "failed to fetch an eightball reading");
                apologize(
                    ctx,
                    "Sorry, the Magic 8-Ball seems cloudy right now. Please try again later.",
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Get a random SFW joke.
    #[poise::command(slash_command)]
    pub async fn joke(ctx: Context<'_>) -> Result<()> {
        info!("Joke command received from user: {}", ctx.author().name);
        ctx.defer().await?;
        match joke::fetch_joke(&ctx.data().http).await {
            Ok(joke_text) => {
                ctx.say(joke_text).await?;
            }
            Err(err) => {
                error!(%err, "failed to fetch a joke");
                apologize(
                    ctx,
                    "Sorry, I couldn't think of a joke right now. Please try again later.",
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Get a random SFW meme.
    #[poise::command(slash_command)]
    pub async fn meme(ctx: Context<'_>) -> Result<()> {
        info!("Meme command received from user: {}", ctx.author().name);
        ctx.defer().await?;
        match meme::fetch_meme_url(&ctx.data().http).await {
            Ok(url) => {
                ctx.say(url).await?;
            }
            Err(err) => {
                error!(%err, "failed to fetch a meme");
                apologize(
                    ctx,
                    "Sorry, the meme stash is empty right now. Please try again later.",
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Get the quote of the day.
    #[poise::command(slash_command)]
    pub async fn qotd(ctx: Context<'_>) -> Result<()> {
        info!("QOTD command received from user: {}", ctx.author().name);
        ctx.defer().await?;
        match qotd::fetch_qotd(&ctx.data().http).await {
            Ok(quote) => {
                ctx.say(quote).await?;
            }
            Err(err) => {
                error!(%err, "failed to fetch the quote of the day");
                apologize(
                    ctx,
                    "Sorry, I couldn't find the quote of the day. Please try again later.",
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Get a random activity suggestion.
    #[poise::command(slash_command)]
    pub async fn bored(ctx: Context<'_>) -> Result<()> {
        info!("Bored command received from user: {}", ctx.author().name);
        ctx.defer().await?;
        match activity::fetch_activity(&ctx.data().http).await {
            Ok(suggestion) => {
                ctx.say(format!("Feeling bored? Why not try this:\n**{suggestion}**"))
                    .await?;
            }
            Err(err) => {
                error!(%err, "failed to fetch an activity");
                apologize(ctx, "Sorry, I'm out of ideas right now. Maybe browse Reddit?").await?;
            }
        }
        Ok(())
    }

    /// Roll a number 1-6!
    #[poise::command(slash_command)]
    pub async fn roll(ctx: Context<'_>) -> Result<()> {
        info!("Roll command received from user: {}", ctx.author().name);
        ctx.say(format!("You rolled a {}!", super::roll_die()))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::roll_die;

    #[test]
    fn test_roll_always_in_range() {
        for _ in 0..1000 {
            let rolled = roll_die();
            assert!((1..=6).contains(&rolled), "rolled {rolled}");
        }
    }

    #[test]
    fn test_roll_distribution_is_roughly_uniform() {
        const ROLLS: usize = 6000;
        let mut counts = [0usize; 6];
        for _ in 0..ROLLS {
            counts[usize::from(roll_die()) - 1] += 1;
        }
        let expected = ROLLS as f64 / 6.0;
        let chi_square: f64 = counts
            .iter()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();
        // five degrees of freedom; a fair die stays well under this bound
        assert!(
            chi_square < 33.0,
            "chi-square {chi_square} suggests a biased die: {counts:?}"
        );
    }
}
