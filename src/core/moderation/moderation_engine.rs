// Auto-moderation engine - core business logic for message evaluation.
//
// This engine handles:
// - Skipping trusted messages (bots, DMs, members who can moderate)
// - Forbidden-language detection
// - Flood detection
// - Deciding whether a timeout is allowed by the role hierarchy
//
// NO Discord dependencies here - it returns a `Decision` and the Discord layer
// carries it out.

use super::moderation_models::{
    humanize_duration, Decision, IncomingMessage, ModerationConfig, ModerationFacts,
    ModerationPolicy, RestrictAction, Violation,
};
use super::permission_gate::PermissionGate;
use super::profanity_matcher::ProfanityMatcher;
use super::spam_tracker::SpamTracker;
use super::text_normalizer::TextNormalizer;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid policy: {0}")]
    Invalid(String),
}

// ============================================================================
// POLICY SOURCE (PORT)
// ============================================================================

/// Where the word list and folding table come from.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn load_policy(&self) -> Result<ModerationPolicy, PolicyError>;
}

// ============================================================================
// CORE ENGINE
// ============================================================================

/// Evaluates each incoming message and decides what should happen to it.
///
/// Shares the matcher and tracker with the rest of the bot; the tracker is
/// the only state an evaluation touches.
pub struct ModerationEngine {
    matcher: Arc<ProfanityMatcher>,
    tracker: Arc<SpamTracker>,
    restrict_duration_sec: u64,
}

impl ModerationEngine {
    pub fn new(
        matcher: Arc<ProfanityMatcher>,
        tracker: Arc<SpamTracker>,
        restrict_duration_sec: u64,
    ) -> Self {
        Self {
            matcher,
            tracker,
            restrict_duration_sec,
        }
    }

    /// Wire up a normalizer, matcher and tracker from a policy and config.
    pub fn from_policy(policy: &ModerationPolicy, config: &ModerationConfig) -> Self {
        let normalizer = TextNormalizer::new(
            policy
                .substitutions
                .iter()
                .map(|(from, to)| (*from, *to)),
        );
        let matcher = ProfanityMatcher::new(&policy.forbidden_terms, normalizer);
        let tracker = SpamTracker::new(config.spam_window_ms, config.spam_max_messages);

        Self::new(
            Arc::new(matcher),
            Arc::new(tracker),
            config.restrict_duration_sec,
        )
    }

    /// Evaluate a message.
    ///
    /// # Returns
    /// An empty `Decision` for skipped or clean messages, otherwise the
    /// violations found (language before spam) and the actions to take.
    pub fn evaluate(&self, message: &IncomingMessage, facts: &ModerationFacts) -> Decision {
        if message.is_bot || !message.guild_context_present || facts.has_moderate_permission {
            return Decision::empty();
        }

        let mut decision = Decision::empty();

        if self.matcher.contains_forbidden_word(&message.text) {
            decision.reasons.push(Violation::InappropriateLanguage);
            decision.delete_message = true;
        }

        if self
            .tracker
            .register_and_check(message.author_id, message.timestamp_ms)
        {
            decision.reasons.push(Violation::Spam);
        }

        if decision.reasons.is_empty() {
            return decision;
        }

        let reason = decision.reason_labels().join(" + ");
        let duration = humanize_duration(self.restrict_duration_sec);

        decision.restrict_authorized =
            PermissionGate::can_moderate(&facts.author, facts.self_power_rank);
        decision.notify_channel_text = Some(format!(
            "<@{}> has been restricted for: **{}**",
            message.author_id, reason
        ));
        decision.notify_user_text = Some(format!(
            "You have been temporarily restricted for: **{}** ({})",
            reason, duration
        ));
        decision.restrict = Some(RestrictAction {
            duration_sec: self.restrict_duration_sec,
            reason,
        });

        decision
    }

    pub fn matcher(&self) -> &Arc<ProfanityMatcher> {
        &self.matcher
    }

    pub fn tracker(&self) -> &Arc<SpamTracker> {
        &self.tracker
    }
}

// ============================================================================
// TESTS
// ============================================================================
