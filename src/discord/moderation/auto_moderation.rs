// Discord-specific auto-moderation - feeds messages to the core engine and
// carries out its decision.
//
// Every side effect is independent: a failed delete doesn't stop the timeout,
// a closed DM doesn't stop the channel notice. Failures are logged, never
// returned, and never touch the engine's state.

use super::member_facts::{bot_access, member_access, MemberAccess};
use crate::core::moderation::{Decision, IncomingMessage, ModerationFacts};
use crate::discord::{Data, Error};
use chrono::Utc;
use poise::serenity_prelude as serenity;

/// What we need from the cache before any await point.
struct GuildSnapshot {
    name: String,
    author: MemberAccess,
    bot: Option<MemberAccess>,
}

/// Evaluate a message and enforce the result.
pub async fn handle_message(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    // Skip bots (including ourselves) before doing any lookups
    if msg.author.bot {
        return Ok(());
    }

    // Only check guild messages
    let Some(guild_id) = msg.guild_id else {
        return Ok(());
    };

    let member = match guild_id.member(ctx, msg.author.id).await {
        Ok(member) => member,
        Err(e) => {
            tracing::debug!("Could not resolve member {}: {}", msg.author.id, e);
            return Ok(());
        }
    };

    let snapshot = {
        let Some(guild) = ctx.cache.guild(guild_id) else {
            tracing::warn!("Guild {} missing from cache, skipping moderation", guild_id);
            return Ok(());
        };

        GuildSnapshot {
            name: guild.name.clone(),
            author: member_access(&guild, &member),
            bot: bot_access(ctx, &guild),
        }
    };

    let facts = ModerationFacts {
        author: snapshot.author.standing,
        has_moderate_permission: snapshot.author.can_moderate_members(),
        self_power_rank: snapshot.bot.map(|bot| bot.standing.power_rank),
    };
    let incoming = IncomingMessage {
        author_id: msg.author.id.get(),
        is_bot: msg.author.bot,
        guild_context_present: true,
        text: msg.content.clone(),
        timestamp_ms: Utc::now().timestamp_millis(),
    };

    let decision = data.engine.evaluate(&incoming, &facts);
    if decision.is_empty() {
        return Ok(());
    }

    tracing::info!(
        user_id = msg.author.id.get(),
        guild_id = guild_id.get(),
        reasons = %decision.reason_labels().join(" + "),
        restrict_authorized = decision.restrict_authorized,
        "Auto-moderation triggered"
    );

    let can_manage_messages = snapshot
        .bot
        .is_some_and(|bot| bot.can_manage_messages());

    apply_decision(ctx, msg, guild_id, &decision, can_manage_messages, &snapshot.name).await;

    Ok(())
}

/// Carry out a non-empty decision.
async fn apply_decision(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    guild_id: serenity::GuildId,
    decision: &Decision,
    can_manage_messages: bool,
    guild_name: &str,
) {
    if decision.delete_message {
        if can_manage_messages {
            if let Err(e) = msg.delete(&ctx.http).await {
                tracing::warn!("Failed to delete flagged message: {}", e);
            }
        } else {
            tracing::debug!("Missing MANAGE_MESSAGES, leaving flagged message in place");
        }
    }

    if let Some(restrict) = &decision.restrict {
        if decision.restrict_authorized {
            if let Err(e) = timeout_member(
                ctx,
                guild_id,
                msg.author.id,
                restrict.duration_sec,
                &restrict.reason,
            )
            .await
            {
                tracing::error!("Failed to timeout user {}: {}", msg.author.id, e);
            }
        } else {
            tracing::info!(
                "Role hierarchy prevents timing out {}, notifying only",
                msg.author.id
            );
        }
    }

    if let Some(text) = &decision.notify_channel_text {
        let embed = serenity::CreateEmbed::new()
            .title("🚫 Auto-Moderation")
            .description(text)
            .colour(serenity::Colour::RED);

        if let Err(e) = msg
            .channel_id
            .send_message(&ctx.http, serenity::CreateMessage::new().embed(embed))
            .await
        {
            tracing::warn!("Failed to send moderation notice: {}", e);
        }
    }

    if let Some(text) = &decision.notify_user_text {
        let dm = warning_dm_embed(text, guild_name);

        // Users with closed DMs are common - not worth more than a debug line
        if let Err(e) = msg
            .author
            .direct_message(ctx, serenity::CreateMessage::new().embed(dm))
            .await
        {
            tracing::debug!("Could not DM {}: {}", msg.author.id, e);
        }
    }
}

/// DM sent to the offender. The text already names the duration.
fn warning_dm_embed(text: &str, guild_name: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("⚠️ Warning")
        .description(text)
        .colour(serenity::Colour::RED)
        .field("Server", guild_name, true)
}

/// Apply a Discord timeout lasting `duration_sec` from now.
pub async fn timeout_member(
    ctx: impl serenity::CacheHttp,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    duration_sec: u64,
    reason: &str,
) -> Result<(), Error> {
    let until = timeout_until(duration_sec)?;

    guild_id
        .edit_member(
            ctx,
            user_id,
            serenity::EditMember::new()
                .disable_communication_until_datetime(until)
                .audit_log_reason(reason),
        )
        .await?;

    Ok(())
}

/// Timestamp `duration_sec` seconds from now.
pub fn timeout_until(duration_sec: u64) -> Result<serenity::Timestamp, Error> {
    let secs = i64::try_from(duration_sec)?;
    let until = serenity::Timestamp::from_unix_timestamp(Utc::now().timestamp().saturating_add(secs))?;
    Ok(until)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_until_is_in_the_future() {
        let now = Utc::now().timestamp();
        let until = timeout_until(300).unwrap();

        let delta = until.unix_timestamp() - now;
        assert!((299..=301).contains(&delta), "delta was {}", delta);
    }

    #[test]
    fn test_warning_dm_mentions_duration_once() {
        let text = "You have been temporarily restricted for: **spam** (5 minutes)";
        let embed = serde_json::to_value(warning_dm_embed(text, "Guild")).unwrap();

        let field_names: Vec<&str> = embed["fields"]
            .as_array()
            .map(|fields| fields.iter().filter_map(|f| f["name"].as_str()).collect())
            .unwrap_or_default();
        assert_eq!(field_names, vec!["Server"]);
        assert_eq!(embed["description"], text);

        let rendered = embed.to_string();
        assert_eq!(rendered.matches("5 minutes").count(), 1);
    }

    #[test]
    fn test_timeout_until_rejects_absurd_durations() {
        assert!(timeout_until(u64::MAX).is_err());
    }
}
