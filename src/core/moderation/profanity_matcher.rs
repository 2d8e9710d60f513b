// Forbidden-word detection on top of the text normalizer.
//
// Whole-token matching only: "bitch!" matches "bitch", "Fuuuck" does not match "fuck".

use std::collections::HashSet;

use super::text_normalizer::TextNormalizer;

/// Immutable forbidden-term set plus the normalizer used to read messages.
#[derive(Debug, Clone)]
pub struct ProfanityMatcher {
    normalizer: TextNormalizer,
    terms: HashSet<String>,
}

impl ProfanityMatcher {
    /// Build a matcher. Terms go through the same normalizer as messages,
    /// so "Enculé" in the list matches "encule" in chat.
    pub fn new<I, S>(terms: I, normalizer: TextNormalizer) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = HashSet::new();

        for term in terms {
            let raw = term.as_ref();
            let normalized = normalizer.normalize(raw);

            if normalized.is_empty() {
                tracing::warn!("Ignoring forbidden term {:?}: empty after normalization", raw);
                continue;
            }
            if normalized.contains(' ') {
                tracing::warn!(
                    "Ignoring forbidden term {:?}: only single words can match",
                    raw
                );
                continue;
            }

            set.insert(normalized);
        }

        Self {
            normalizer,
            terms: set,
        }
    }

    /// Does the message contain at least one forbidden word?
    pub fn contains_forbidden_word(&self, raw: &str) -> bool {
        let normalized = self.normalizer.normalize(raw);
        let tokens: HashSet<&str> = normalized.split_whitespace().collect();
        tokens.iter().any(|token| self.terms.contains(*token))
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::moderation_models::DEFAULT_FORBIDDEN_TERMS;

    fn default_matcher() -> ProfanityMatcher {
        ProfanityMatcher::new(DEFAULT_FORBIDDEN_TERMS, TextNormalizer::default())
    }

    #[test]
    fn test_clean_message_passes() {
        let matcher = default_matcher();
        assert!(!matcher.contains_forbidden_word("Hello everyone, how is it going?"));
        assert!(!matcher.contains_forbidden_word(""));
    }

    #[test]
    fn test_punctuation_glued_words_are_caught() {
        let matcher = default_matcher();
        assert!(matcher.contains_forbidden_word("you bitch!"));
        assert!(matcher.contains_forbidden_word("you,bitch"));
        assert!(matcher.contains_forbidden_word("...FUCK..."));
    }

    #[test]
    fn test_case_accent_and_symbol_evasion() {
        let matcher = default_matcher();
        assert!(matcher.contains_forbidden_word("CONNARD"));
        assert!(matcher.contains_forbidden_word("cOnNard"));
        assert!(matcher.contains_forbidden_word("conn@rd"));
        assert!(matcher.contains_forbidden_word("espèce d'enculé"));
        assert!(matcher.contains_forbidden_word("$alope"));
    }

    #[test]
    fn test_no_fuzzy_or_substring_matching() {
        let matcher = default_matcher();
        assert!(!matcher.contains_forbidden_word("Fuuuck"));
        assert!(!matcher.contains_forbidden_word("c0nnard"));
        // Substrings of longer words are not tokens
        assert!(!matcher.contains_forbidden_word("shitake mushrooms"));
        assert!(!matcher.contains_forbidden_word("computer"));
    }

    #[test]
    fn test_terms_are_normalized_and_invalid_ones_dropped() {
        let matcher = ProfanityMatcher::new(
            ["Crétin", "  ", "two words", "!!!"],
            TextNormalizer::default(),
        );

        assert_eq!(matcher.term_count(), 1);
        assert!(matcher.contains_forbidden_word("quel cretin"));
        assert!(!matcher.contains_forbidden_word("two words"));
    }
}
