//! Utility commands - echo, weather lookup, help, and the welcome-image test.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::adapters::weather;
    use crate::bot::Context;
    use crate::errors::{Error, Result};
    use crate::welcome;
    use poise::serenity_prelude as serenity;
    use tracing::{error, info};

    /// Echoes a message.
    #[poise::command(slash_command)]
    pub async fn echo(
        ctx: Context<'_>,
        #[description = "The message to echo."] message: String,
    ) -> Result<()> {
        info!("Echo command received from user: {}", ctx.author().name);
        ctx.say(message).await?;
        Ok(())
    }

    /// Get the weather for a specified city.
    #[poise::command(slash_command)]
    pub async fn weather(
        ctx: Context<'_>,
        #[description = "The city name (e.g., 'London' or 'London,UK')."] city: String,
    ) -> Result<()> {
        info!(user = %ctx.author().name, city, "Weather command received");
        ctx.defer_ephemeral().await?;

        let Some(api_key) = ctx.data().config.weather_api_key.clone() else {
            error!("weather command invoked but no API key is configured");
            ctx.say(
                "Sorry, the weather service is not configured correctly (missing API key). \
                 Please contact the server owner.",
            )
            .await?;
            return Ok(());
        };

        match weather::fetch_weather(&ctx.data().http, &api_key, &city).await {
            Ok(report) => {
                ctx.send(poise::CreateReply::default().embed(report.embed().render()))
                    .await?;
            }
            Err(Error::CityNotFound) => {
                ctx.say(format!(
                    "I couldn't find a city named '{city}'. Check the spelling and try again."
                ))
                .await?;
            }
            Err(Error::BadApiKey) => {
                error!("weather API key was rejected upstream");
                ctx.say(
                    "Sorry, the weather service rejected the configured API key. \
                     Please contact the server owner.",
                )
                .await?;
            }
            Err(err) => {
                error!(%err, city, "failed to fetch weather");
                ctx.say(format!(
                    "Sorry, there was an error fetching the weather for '{city}'. \
                     Please try again later."
                ))
                .await?;
            }
        }
        Ok(())
    }

    /// Provide assistance in using commands!
    #[poise::command(slash_command)]
    pub async fn help(ctx: Context<'_>) -> Result<()> {
        info!("Help command received from user: {}", ctx.author().name);
        let help_text = "**Commander Help**\n\
        Here is a summary of all available commands.\n\n\
        **Utility Commands**\n\
        • `/echo <message>` - Echoes your message back.\n\
        • `/weather <city>` - Current, high, and low temperatures for a city.\n\
        • `/welcome` - Generates a test welcome image using your info.\n\
        • `/help` - Shows this help message.\n\n\
        **Fun Commands**\n\
        • `/cocktail` - A random cocktail suggestion.\n\
        • `/eightball <question>` - Ask the magic 8-ball a question.\n\
        • `/roll` - Roll a number 1-6.\n\
        • `/joke` - A random SFW joke.\n\
        • `/meme` - A random SFW meme.\n\
        • `/qotd` - The quote of the day.\n\
        • `/bored` - A random activity suggestion.";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Generates a test welcome image using your info.
    #[poise::command(slash_command)]
    pub async fn welcome(ctx: Context<'_>) -> Result<()> {
        info!("Welcome test command received from user: {}", ctx.author().name);
        ctx.defer_ephemeral().await?;

        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("This command can only be used in a server.").await?;
            return Ok(());
        };
        let guild = guild_id.to_partial_guild(ctx.http()).await?;
        let member_name = ctx.author().display_name().to_string();
        let avatar_url = ctx.author().face();

        match welcome::generate(
            &ctx.data().http,
            &ctx.data().config.welcome,
            &avatar_url,
            &member_name,
            &guild.name,
        )
        .await
        {
            Ok(image) => {
                ctx.send(
                    poise::CreateReply::default()
                        .content("Here is your test welcome image:")
                        .attachment(serenity::CreateAttachment::bytes(image, "welcome.png"))
                        .ephemeral(true),
                )
                .await?;
            }
            Err(err) => {
                error!(%err, "failed to generate the test welcome image");
                ctx.say(
                    "Sorry, I couldn't generate the test welcome image. \
                     Please check the bot logs for errors.",
                )
                .await?;
            }
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
