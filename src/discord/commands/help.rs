use crate::core::moderation::humanize_duration;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

// (command, what it does) in the order they are shown
const MODERATION_COMMANDS: &[(&str, &str)] = &[
    ("/kick", "Kick a member"),
    ("/ban", "Ban a member"),
    ("/mute", "Timeout a member"),
    ("/unmute", "Remove a timeout"),
    ("/clear", "Delete recent messages"),
    ("/warn", "Warn a member"),
];

/// Check that the bot is online.
#[poise::command(slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let latency_ms = ctx.ping().await.as_millis();
    ctx.say(format!("🏓 Pong! Latency: {} ms", latency_ms))
        .await?;
    Ok(())
}

/// Show the moderation commands and auto-moderation settings.
#[poise::command(slash_command)]
pub async fn modhelp(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let config = &data.config;

    let mut embed = serenity::CreateEmbed::new()
        .title("🛡️ Moderation Commands")
        .description("Here are all the available commands:")
        .colour(serenity::Colour::BLUE);

    for (name, description) in MODERATION_COMMANDS {
        embed = embed.field(*name, *description, true);
    }

    embed = embed
        .field(
            "Auto-moderation",
            format!(
                "• {} forbidden words watched\n\
                 • More than {} messages in {} seconds counts as spam\n\
                 • Violations get a {} timeout",
                data.engine.matcher().term_count(),
                config.spam_max_messages,
                config.spam_window_ms / 1000,
                humanize_duration(config.restrict_duration_sec)
            ),
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(
            "Security Bot • Automatic protection active",
        ))
        .timestamp(serenity::Timestamp::now());

    ctx.send(
        poise::CreateReply::default()
            .embed(embed)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
