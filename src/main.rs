// This is the entry point of the moderation bot.
//
// **Architecture Overview:**
// - `core/` = Moderation decision engine (platform-agnostic)
// - `infra/` = Implementations of core traits (policy file loading)
// - `discord/` = Discord-specific adapters (commands, events, enforcement)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands, event handlers and background tasks

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::moderation::{ModerationConfig, ModerationEngine, PolicyStore, SpamTracker};
use crate::discord::commands::{help, presence};
use crate::discord::{auto_moderation, moderation_commands, Data, Error};
use crate::infra::moderation::JsonPolicyStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_POLICY_PATH: &str = "data/moderation_policy.json";

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        // Log and carry on - one bad message must not take the handler down
        if let Err(e) = auto_moderation::handle_message(ctx, new_message, data).await {
            tracing::error!("Error during auto-moderation: {}", e);
        }
    }

    Ok(())
}

/// Periodically drop spam windows of users who went quiet.
fn spawn_spam_sweeper(tracker: Arc<SpamTracker>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));

        loop {
            interval.tick().await;

            let now_ms = chrono::Utc::now().timestamp_millis();
            let evicted = tracker.sweep(now_ms);
            if evicted > 0 {
                tracing::debug!(
                    evicted,
                    remaining = tracker.tracked_users(),
                    "Swept idle spam windows"
                );
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening (RUST_LOG overrides)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let token = std::env::var("DISCORD_TOKEN").context(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    )?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let config = ModerationConfig::from_lookup(|key| std::env::var(key).ok());

    let policy_path = std::env::var("MODERATION_POLICY_FILE")
        .unwrap_or_else(|_| DEFAULT_POLICY_PATH.to_string());
    let policy = JsonPolicyStore::new(&policy_path)
        .load_policy()
        .await
        .with_context(|| format!("Failed to load moderation policy from {}", policy_path))?;

    let engine = Arc::new(ModerationEngine::from_policy(&policy, &config));

    tracing::info!(
        forbidden_terms = engine.matcher().term_count(),
        spam_window_ms = config.spam_window_ms,
        spam_max_messages = config.spam_max_messages,
        restrict_duration_sec = config.restrict_duration_sec,
        "Moderation engine ready"
    );

    let data = Data {
        engine: Arc::clone(&engine),
        config: config.clone(),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                help::ping(),
                help::modhelp(),
                moderation_commands::kick(),
                moderation_commands::ban(),
                moderation_commands::mute(),
                moderation_commands::unmute(),
                moderation_commands::clear(),
                moderation_commands::warn(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                tracing::info!("Connected as {}, slash commands registered", ready.user.name);
                presence::on_ready(ctx);

                spawn_spam_sweeper(Arc::clone(data.engine.tracker()), config.sweep_interval_secs);

                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;

    Ok(())
}
