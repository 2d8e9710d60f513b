// This module handles bot presence and lifecycle events.
//
// Discord-layer glue only: Context, ActivityData and OnlineStatus.

use poise::serenity_prelude as serenity;

/// Show members that the bot is on duty.
pub fn set_watching(ctx: &serenity::Context) {
    // serenity 0.12 exposes builder helpers on ActivityData, not Activity.
    let activity = serenity::ActivityData::watching("Protecting the server 🛡️");
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}

/// Called once the bot is ready so the default presence is set in one place.
pub fn on_ready(ctx: &serenity::Context) {
    set_watching(ctx);
}
