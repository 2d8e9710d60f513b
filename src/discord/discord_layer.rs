// Discord layer - commands and event handlers.
//
// Everything here translates between serenity types and the core engine:
// gather facts -> ask the core -> carry out what it decided.

use crate::core::moderation::{ModerationConfig, ModerationEngine};
use std::sync::Arc;

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "moderation/auto_moderation.rs"]
pub mod auto_moderation;

#[path = "moderation/member_facts.rs"]
pub mod member_facts;

#[path = "moderation/commands.rs"]
pub mod moderation_commands;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command and event.
pub struct Data {
    pub engine: Arc<ModerationEngine>,
    pub config: ModerationConfig,
}
