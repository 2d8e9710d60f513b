// Moderation slash commands.
//
// Each command is its own request handler:
// 1. poise checks the invoker's (and the bot's) Discord permissions
// 2. the core PermissionGate checks the role hierarchy against the target
// 3. the Discord action runs and the outcome is reported back
//
// No business logic lives here beyond that translation.

use super::auto_moderation::timeout_member;
use super::member_facts::{bot_access, member_access};
use crate::core::moderation::{PermissionGate, MAX_RESTRICT_DURATION_SEC};
use crate::discord::{Context, Error};
use chrono::Utc;
use poise::serenity_prelude as serenity;

const DEFAULT_REASON: &str = "No reason given";
const HIERARCHY_REFUSAL: &str = "❌ I can't moderate this user (hierarchy/permissions).";
const DEFAULT_MUTE_MINUTES: u32 = 5;
const MAX_MUTE_MINUTES: u32 = (MAX_RESTRICT_DURATION_SEC / 60) as u32;

/// Kick a member from the server.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "KICK_MEMBERS",
    required_bot_permissions = "KICK_MEMBERS",
    default_member_permissions = "KICK_MEMBERS"
)]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "Member to kick"] user: serenity::Member,
    #[description = "Reason for the kick"] reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let reason = reason.unwrap_or_else(|| DEFAULT_REASON.to_string());

    if !can_moderate(ctx, &user) {
        return reply_ephemeral(ctx, HIERARCHY_REFUSAL).await;
    }

    match guild_id
        .kick_with_reason(ctx.http(), user.user.id, &reason)
        .await
    {
        Ok(()) => {
            tracing::info!(
                moderator_id = ctx.author().id.get(),
                user_id = user.user.id.get(),
                "Member kicked"
            );
            ctx.say(format!("✅ {} has been kicked. Reason: {}", user.user.name, reason))
                .await?;
        }
        Err(e) => {
            tracing::warn!("Failed to kick {}: {}", user.user.id, e);
            reply_ephemeral(ctx, "❌ I can't kick this user.").await?;
        }
    }

    Ok(())
}

/// Ban a user from the server.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "BAN_MEMBERS",
    required_bot_permissions = "BAN_MEMBERS",
    default_member_permissions = "BAN_MEMBERS"
)]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "User to ban"] user: serenity::User,
    #[description = "Reason for the ban"] reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let reason = reason.unwrap_or_else(|| DEFAULT_REASON.to_string());

    // Users who already left have no hierarchy to check
    let member = ctx
        .guild()
        .and_then(|guild| guild.members.get(&user.id).cloned());
    if let Some(member) = member {
        if !can_moderate(ctx, &member) {
            return reply_ephemeral(ctx, HIERARCHY_REFUSAL).await;
        }
    }

    match guild_id
        .ban_with_reason(ctx.http(), user.id, 0, &reason)
        .await
    {
        Ok(()) => {
            tracing::info!(
                moderator_id = ctx.author().id.get(),
                user_id = user.id.get(),
                "User banned"
            );
            ctx.say(format!("✅ {} has been banned. Reason: {}", user.name, reason))
                .await?;
        }
        Err(e) => {
            tracing::warn!("Failed to ban {}: {}", user.id, e);
            reply_ephemeral(ctx, "❌ I can't ban this user.").await?;
        }
    }

    Ok(())
}

/// Timeout a member (native Discord mute).
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    required_bot_permissions = "MODERATE_MEMBERS",
    default_member_permissions = "MODERATE_MEMBERS"
)]
pub async fn mute(
    ctx: Context<'_>,
    #[description = "Member to mute"] user: serenity::Member,
    #[description = "Duration in minutes (default: 5)"] minutes: Option<u32>,
    #[description = "Reason for the mute"] reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let reason = reason.unwrap_or_else(|| DEFAULT_REASON.to_string());
    let minutes = mute_minutes(minutes);

    if !can_moderate(ctx, &user) {
        return reply_ephemeral(ctx, HIERARCHY_REFUSAL).await;
    }

    match timeout_member(
        ctx.serenity_context(),
        guild_id,
        user.user.id,
        u64::from(minutes) * 60,
        &reason,
    )
    .await
    {
        Ok(()) => {
            ctx.say(format!(
                "✅ {} has been muted for {} minutes. Reason: {}",
                user.user.name, minutes, reason
            ))
            .await?;
        }
        Err(e) => {
            tracing::warn!("Failed to mute {}: {}", user.user.id, e);
            reply_ephemeral(ctx, "❌ Error while muting.").await?;
        }
    }

    Ok(())
}

/// Remove a member's timeout.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    required_bot_permissions = "MODERATE_MEMBERS",
    default_member_permissions = "MODERATE_MEMBERS"
)]
pub async fn unmute(
    ctx: Context<'_>,
    #[description = "Member to unmute"] user: serenity::Member,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let result = guild_id
        .edit_member(
            ctx.serenity_context(),
            user.user.id,
            serenity::EditMember::new()
                .enable_communication()
                .audit_log_reason("Timeout removed"),
        )
        .await;

    match result {
        Ok(_) => {
            // Fresh start, otherwise the burst that got them muted counts again
            ctx.data().engine.tracker().forget(user.user.id.get());
            ctx.say(format!("✅ {} has been unmuted.", user.user.name))
                .await?;
        }
        Err(e) => {
            tracing::warn!("Failed to unmute {}: {}", user.user.id, e);
            reply_ephemeral(ctx, "❌ This user isn't muted, or something went wrong.").await?;
        }
    }

    Ok(())
}

/// Delete recent messages in this channel (1-100).
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_MESSAGES",
    required_bot_permissions = "MANAGE_MESSAGES",
    default_member_permissions = "MANAGE_MESSAGES"
)]
pub async fn clear(
    ctx: Context<'_>,
    #[description = "Number of messages to delete (1-100)"]
    #[min = 1]
    #[max = 100]
    count: u8,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;

    let channel_id = ctx.channel_id();
    let messages = channel_id
        .messages(ctx.http(), serenity::GetMessages::new().limit(count))
        .await?;

    let (recent, old) = split_by_bulk_age(
        messages.iter().map(|m| (m.id, m.timestamp.unix_timestamp())),
        Utc::now().timestamp(),
    );

    let mut deleted = 0usize;
    let mut failures = 0usize;

    // Bulk delete needs at least two ids
    match recent.as_slice() {
        [] => {}
        [single] => match channel_id.delete_message(ctx.http(), *single).await {
            Ok(()) => deleted += 1,
            Err(e) => {
                tracing::warn!("Failed to delete message {}: {}", single, e);
                failures += 1;
            }
        },
        _ => match channel_id.delete_messages(ctx.http(), &recent).await {
            Ok(()) => deleted += recent.len(),
            Err(e) => {
                tracing::warn!("Failed to bulk delete in {}: {}", channel_id, e);
                failures += recent.len();
            }
        },
    }

    // Too old for the bulk endpoint, one request each
    for id in old {
        match channel_id.delete_message(ctx.http(), id).await {
            Ok(()) => deleted += 1,
            Err(e) => {
                tracing::warn!("Failed to delete message {}: {}", id, e);
                failures += 1;
            }
        }
    }

    tracing::info!(
        moderator_id = ctx.author().id.get(),
        channel_id = channel_id.get(),
        deleted,
        failures,
        "Messages cleared"
    );

    if failures == 0 {
        ctx.say(format!("✅ {} messages deleted!", deleted)).await?;
    } else {
        ctx.say(format!(
            "⚠️ {} messages deleted, {} could not be deleted.",
            deleted, failures
        ))
        .await?;
    }

    Ok(())
}

/// Warn a user (public notice + DM).
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    default_member_permissions = "MODERATE_MEMBERS"
)]
pub async fn warn(
    ctx: Context<'_>,
    #[description = "User to warn"] user: serenity::User,
    #[description = "Reason for the warning"] reason: String,
) -> Result<(), Error> {
    let guild_name = ctx
        .guild()
        .map(|guild| guild.name.clone())
        .unwrap_or_else(|| "this server".to_string());

    let embed = serenity::CreateEmbed::new()
        .title("⚠️ Warning")
        .description(format!("<@{}> has received a warning", user.id))
        .colour(serenity::Colour::ORANGE)
        .field("Reason", &reason, false)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "By {}",
            ctx.author().name
        )))
        .timestamp(serenity::Timestamp::now());

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    let dm = serenity::CreateMessage::new().content(format!(
        "⚠️ You have received a warning on **{}** for: {}",
        guild_name, reason
    ));
    if let Err(e) = user.direct_message(ctx.serenity_context(), dm).await {
        tracing::debug!("Could not DM warning to {}: {}", user.id, e);
    }

    Ok(())
}

/// Role-hierarchy check for a command target. Fails closed without a cached guild.
fn can_moderate(ctx: Context<'_>, target: &serenity::Member) -> bool {
    let Some(guild) = ctx.guild() else {
        return false;
    };

    let target_access = member_access(&guild, target);
    let self_rank = bot_access(ctx.serenity_context(), &guild).map(|bot| bot.standing.power_rank);

    PermissionGate::can_moderate(&target_access.standing, self_rank)
}

/// Discord refuses to bulk delete messages older than 14 days
const BULK_DELETE_MAX_AGE_SECS: i64 = 14 * 24 * 60 * 60;

/// Split `(id, created_at)` pairs into bulk-deletable ids and ids that need
/// a single delete each. Messages close to the limit go to the single side.
fn split_by_bulk_age(
    messages: impl IntoIterator<Item = (serenity::MessageId, i64)>,
    now_secs: i64,
) -> (Vec<serenity::MessageId>, Vec<serenity::MessageId>) {
    // A minute of slack so a message doesn't cross the limit mid-request
    let cutoff = now_secs - BULK_DELETE_MAX_AGE_SECS + 60;

    let mut recent = Vec::new();
    let mut old = Vec::new();
    for (id, created_at) in messages {
        if created_at > cutoff {
            recent.push(id);
        } else {
            old.push(id);
        }
    }
    (recent, old)
}

/// Clamp a requested mute length into what Discord accepts.
fn mute_minutes(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_MUTE_MINUTES)
        .clamp(1, MAX_MUTE_MINUTES)
}

async fn reply_ephemeral(ctx: Context<'_>, text: &str) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(text)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mute_minutes_defaults_to_five() {
        assert_eq!(mute_minutes(None), 5);
    }

    #[test]
    fn test_mute_minutes_is_clamped() {
        assert_eq!(mute_minutes(Some(0)), 1);
        assert_eq!(mute_minutes(Some(30)), 30);
        assert_eq!(mute_minutes(Some(u32::MAX)), MAX_MUTE_MINUTES);
        assert_eq!(MAX_MUTE_MINUTES, 40_320);
    }

    #[test]
    fn test_old_messages_are_kept_out_of_bulk_delete() {
        let now = 1_700_000_000;
        let day = 24 * 60 * 60;
        let id = serenity::MessageId::new;

        let (recent, old) = split_by_bulk_age(
            [
                (id(1), now - 60),
                (id(2), now - 13 * day),
                (id(3), now - 14 * day),
                (id(4), now - 30 * day),
            ],
            now,
        );

        assert_eq!(recent, vec![id(1), id(2)]);
        assert_eq!(old, vec![id(3), id(4)]);
    }

    #[test]
    fn test_quiet_channel_has_nothing_to_bulk_delete() {
        let now = 1_700_000_000;
        let (recent, old) = split_by_bulk_age(
            [(serenity::MessageId::new(9), now - 100 * 24 * 60 * 60)],
            now,
        );

        assert!(recent.is_empty());
        assert_eq!(old, vec![serenity::MessageId::new(9)]);
    }
}
