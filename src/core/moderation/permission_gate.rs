// Role-hierarchy check consulted before every enforcement action.

use super::moderation_models::{MemberStanding, PowerRank};

/// Decides whether the bot may act against a member.
///
/// Rules, first match wins:
/// 1. administrators can't be moderated
/// 2. the guild owner can't be moderated
/// 3. otherwise the bot's top role must strictly outrank the target's
///
/// `self_power_rank` is `None` when the bot has no guild context or its own
/// member can't be resolved; that always refuses.
pub struct PermissionGate;

impl PermissionGate {
    pub fn can_moderate(target: &MemberStanding, self_power_rank: Option<PowerRank>) -> bool {
        let Some(self_rank) = self_power_rank else {
            return false;
        };

        if target.is_administrator {
            return false;
        }
        if target.is_owner {
            return false;
        }

        self_rank > target.power_rank
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(power_rank: PowerRank) -> MemberStanding {
        MemberStanding {
            power_rank,
            is_administrator: false,
            is_owner: false,
        }
    }

    #[test]
    fn test_higher_rank_can_moderate() {
        assert!(PermissionGate::can_moderate(&member(3), Some(5)));
    }

    #[test]
    fn test_equal_or_lower_rank_cannot_moderate() {
        assert!(!PermissionGate::can_moderate(&member(5), Some(5)));
        assert!(!PermissionGate::can_moderate(&member(6), Some(5)));
    }

    #[test]
    fn test_administrator_is_never_moderated() {
        let admin = MemberStanding {
            is_administrator: true,
            ..member(0)
        };
        assert!(!PermissionGate::can_moderate(&admin, Some(100)));
    }

    #[test]
    fn test_owner_is_never_moderated() {
        let owner = MemberStanding {
            is_owner: true,
            ..member(0)
        };
        assert!(!PermissionGate::can_moderate(&owner, Some(100)));
    }

    #[test]
    fn test_missing_context_fails_closed() {
        assert!(!PermissionGate::can_moderate(&member(0), None));
    }
}
