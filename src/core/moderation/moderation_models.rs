// Moderation domain models - data structures for the auto-moderation engine.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer builds them from serenity data and turns a `Decision`
// back into Discord actions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Position of a member's highest role. Higher outranks lower.
pub type PowerRank = u32;

/// Built-in forbidden terms, used when no policy file is configured.
pub const DEFAULT_FORBIDDEN_TERMS: &[&str] = &[
    "connard", "salope", "pute", "encule", "fdp", "shit", "fuck", "bitch", "asshole", "damn",
    "cunt", "whore",
];

/// Built-in leetspeak / symbol folding table.
pub const DEFAULT_SUBSTITUTIONS: &[(char, char)] =
    &[('@', 'a'), ('$', 's'), ('€', 'e'), ('§', 's'), ('5', 's')];

// ============================================================================
// FACTS (input)
// ============================================================================

/// Where a member sits in the guild hierarchy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberStanding {
    pub power_rank: PowerRank,
    pub is_administrator: bool,
    pub is_owner: bool,
}

/// Everything the engine needs to know about the author and the bot itself.
///
/// Built fresh for every message; never stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModerationFacts {
    pub author: MemberStanding,
    /// Author can already moderate members - never auto-moderated.
    pub has_moderate_permission: bool,
    /// `None` when the bot's own member could not be resolved.
    pub self_power_rank: Option<PowerRank>,
}

/// A message as seen by the engine.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub author_id: u64,
    pub is_bot: bool,
    pub guild_context_present: bool,
    pub text: String,
    pub timestamp_ms: i64,
}

// ============================================================================
// DECISION (output)
// ============================================================================

/// A policy violation detected in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    InappropriateLanguage,
    Spam,
}

impl Violation {
    pub fn label(&self) -> &'static str {
        match self {
            Violation::InappropriateLanguage => "inappropriate language",
            Violation::Spam => "spam",
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A temporary restriction (Discord timeout) to apply to the author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictAction {
    pub duration_sec: u64,
    pub reason: String,
}

/// Outcome of evaluating one message.
///
/// The Discord layer is expected to:
/// - delete the message when `delete_message` is set (if it can manage messages)
/// - apply `restrict` only when `restrict_authorized` is true
/// - send both notifications whenever they are present
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decision {
    pub reasons: Vec<Violation>,
    pub delete_message: bool,
    pub restrict: Option<RestrictAction>,
    pub restrict_authorized: bool,
    pub notify_channel_text: Option<String>,
    pub notify_user_text: Option<String>,
}

impl Decision {
    /// A decision that asks for nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn reason_labels(&self) -> Vec<&'static str> {
        self.reasons.iter().map(Violation::label).collect()
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Word list and folding table. Loaded once at startup, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerationPolicy {
    pub forbidden_terms: Vec<String>,
    pub substitutions: BTreeMap<char, char>,
}

impl Default for ModerationPolicy {
    fn default() -> Self {
        Self {
            forbidden_terms: DEFAULT_FORBIDDEN_TERMS
                .iter()
                .map(|term| term.to_string())
                .collect(),
            substitutions: DEFAULT_SUBSTITUTIONS.iter().copied().collect(),
        }
    }
}

/// Longest timeout Discord accepts (28 days).
pub const MAX_RESTRICT_DURATION_SEC: u64 = 28 * 24 * 60 * 60;

/// Numeric knobs for the engine and its background sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationConfig {
    /// Sliding spam window in milliseconds
    pub spam_window_ms: u64,
    /// Messages allowed inside the window; one more is spam
    pub spam_max_messages: usize,
    /// Timeout applied on a violation
    pub restrict_duration_sec: u64,
    /// How often idle spam windows are evicted
    pub sweep_interval_secs: u64,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            spam_window_ms: 10_000,     // 10 seconds...
            spam_max_messages: 5,       // ...5 messages allowed
            restrict_duration_sec: 300, // 5 minute timeout
            sweep_interval_secs: 60,
        }
    }
}

impl ModerationConfig {
    pub const SPAM_WINDOW_MS_KEY: &'static str = "MODERATION_SPAM_WINDOW_MS";
    pub const SPAM_MAX_MESSAGES_KEY: &'static str = "MODERATION_SPAM_MAX_MESSAGES";
    pub const RESTRICT_SECS_KEY: &'static str = "MODERATION_RESTRICT_SECS";
    pub const SWEEP_INTERVAL_SECS_KEY: &'static str = "MODERATION_SWEEP_INTERVAL_SECS";

    /// Build a config from a key lookup (usually `std::env::var`).
    ///
    /// Missing keys keep their default. Values that don't parse are logged
    /// and also keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            spam_window_ms: parse_or(&lookup, Self::SPAM_WINDOW_MS_KEY, defaults.spam_window_ms),
            spam_max_messages: parse_or(
                &lookup,
                Self::SPAM_MAX_MESSAGES_KEY,
                defaults.spam_max_messages,
            ),
            restrict_duration_sec: capped_restrict_duration(parse_or(
                &lookup,
                Self::RESTRICT_SECS_KEY,
                defaults.restrict_duration_sec,
            )),
            sweep_interval_secs: parse_or(
                &lookup,
                Self::SWEEP_INTERVAL_SECS_KEY,
                defaults.sweep_interval_secs,
            ),
        }
    }
}

fn capped_restrict_duration(secs: u64) -> u64 {
    if secs > MAX_RESTRICT_DURATION_SEC {
        tracing::warn!(
            "{}={} exceeds Discord's 28 day timeout limit, capping to {}",
            ModerationConfig::RESTRICT_SECS_KEY,
            secs,
            MAX_RESTRICT_DURATION_SEC
        );
        return MAX_RESTRICT_DURATION_SEC;
    }
    secs
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
        None => default,
    }
}

/// Render a duration the way notifications show it ("5 minutes", "1 hour").
pub fn humanize_duration(secs: u64) -> String {
    let (amount, unit) = if secs >= 3600 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };

    if amount == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", amount, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_matches_documented_values() {
        let config = ModerationConfig::default();
        assert_eq!(config.spam_window_ms, 10_000);
        assert_eq!(config.spam_max_messages, 5);
        assert_eq!(config.restrict_duration_sec, 300);
    }

    #[test]
    fn test_config_from_lookup_overrides_and_falls_back() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ModerationConfig::SPAM_WINDOW_MS_KEY, "2500"),
            (ModerationConfig::SPAM_MAX_MESSAGES_KEY, "not-a-number"),
            (ModerationConfig::RESTRICT_SECS_KEY, " 600 "),
        ]);

        let config = ModerationConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.spam_window_ms, 2500);
        assert_eq!(config.spam_max_messages, 5);
        assert_eq!(config.restrict_duration_sec, 600);
        assert_eq!(config.sweep_interval_secs, 60);
    }

    #[test]
    fn test_restrict_duration_is_capped_at_discord_limit() {
        let over = (MAX_RESTRICT_DURATION_SEC + 1).to_string();
        let config = ModerationConfig::from_lookup(|key| {
            (key == ModerationConfig::RESTRICT_SECS_KEY).then(|| over.clone())
        });
        assert_eq!(config.restrict_duration_sec, MAX_RESTRICT_DURATION_SEC);

        let exact = MAX_RESTRICT_DURATION_SEC.to_string();
        let config = ModerationConfig::from_lookup(|key| {
            (key == ModerationConfig::RESTRICT_SECS_KEY).then(|| exact.clone())
        });
        assert_eq!(config.restrict_duration_sec, 2_419_200);
    }

    #[test]
    fn test_default_policy_has_builtin_terms_and_table() {
        let policy = ModerationPolicy::default();
        assert_eq!(policy.forbidden_terms.len(), DEFAULT_FORBIDDEN_TERMS.len());
        assert!(policy.forbidden_terms.iter().any(|t| t == "salope"));
        assert_eq!(policy.substitutions.get(&'@'), Some(&'a'));
        assert_eq!(policy.substitutions.get(&'5'), Some(&'s'));
    }

    #[test]
    fn test_violation_labels() {
        assert_eq!(
            Violation::InappropriateLanguage.to_string(),
            "inappropriate language"
        );
        assert_eq!(Violation::Spam.label(), "spam");
    }

    #[test]
    fn test_humanize_duration() {
        assert_eq!(humanize_duration(300), "5 minutes");
        assert_eq!(humanize_duration(60), "1 minute");
        assert_eq!(humanize_duration(3600), "1 hour");
        assert_eq!(humanize_duration(90), "90 seconds");
        assert_eq!(humanize_duration(1), "1 second");
    }
}
