// Turns cached guild/member data into the hierarchy facts the core works with.
//
// Only reads from serenity types; nothing here awaits, so callers can use it
// while holding a cache guard and drop the guard before any HTTP call.

use crate::core::moderation::{MemberStanding, PowerRank};
use poise::serenity_prelude as serenity;

/// A member's hierarchy standing plus their effective guild permissions.
#[derive(Debug, Clone, Copy)]
pub struct MemberAccess {
    pub standing: MemberStanding,
    pub permissions: serenity::Permissions,
}

impl MemberAccess {
    pub fn can_moderate_members(&self) -> bool {
        self.permissions.moderate_members()
    }

    pub fn can_manage_messages(&self) -> bool {
        self.permissions.manage_messages()
    }
}

/// Resolve a member's standing inside a cached guild.
pub fn member_access(guild: &serenity::Guild, member: &serenity::Member) -> MemberAccess {
    // @everyone shares its id with the guild
    let everyone = guild
        .roles
        .get(&serenity::RoleId::new(guild.id.get()))
        .map(|role| role.permissions)
        .unwrap_or_else(serenity::Permissions::empty);

    let roles = member
        .roles
        .iter()
        .filter_map(|role_id| guild.roles.get(role_id))
        .map(|role| (role.position, role.permissions));

    fold_roles(guild.owner_id == member.user.id, everyone, roles)
}

/// Fold a member's roles into a standing.
///
/// Power rank is the highest role position (0 with only @everyone).
/// Owners and administrators end up with every permission, matching how
/// Discord itself resolves them.
pub fn fold_roles(
    is_owner: bool,
    everyone: serenity::Permissions,
    roles: impl IntoIterator<Item = (u16, serenity::Permissions)>,
) -> MemberAccess {
    let mut power_rank: PowerRank = 0;
    let mut permissions = everyone;

    for (position, role_permissions) in roles {
        power_rank = power_rank.max(PowerRank::from(position));
        permissions |= role_permissions;
    }

    let is_administrator = permissions.administrator();
    if is_owner || is_administrator {
        permissions = serenity::Permissions::all();
    }

    MemberAccess {
        standing: MemberStanding {
            power_rank,
            is_administrator,
            is_owner,
        },
        permissions,
    }
}

/// Standing of the bot's own member, if the guild and member are cached.
pub fn bot_access(ctx: &serenity::Context, guild: &serenity::Guild) -> Option<MemberAccess> {
    let bot_id = ctx.cache.current_user().id;
    guild
        .members
        .get(&bot_id)
        .map(|member| member_access(guild, member))
}
