// Text folding for the profanity filter.
//
// Turns "C0nn@rd!!" style evasion back into plain tokens:
// lowercase -> strip accents -> fold symbols -> punctuation to spaces -> squeeze spaces.

use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::moderation_models::DEFAULT_SUBSTITUTIONS;

/// Canonicalizes raw message text so simple evasion tricks still match.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    substitutions: HashMap<char, char>,
}

impl TextNormalizer {
    /// Build a normalizer from a symbol folding table (e.g. `@ -> a`).
    ///
    /// Entries are folded the same way text is, so the table can't re-introduce
    /// uppercase or accented characters. Entries that would chain into another
    /// entry (`5 -> s` next to `s -> z`) are skipped, otherwise a second pass
    /// over the output would change it again.
    pub fn new(table: impl IntoIterator<Item = (char, char)>) -> Self {
        let mut folded = HashMap::new();
        for (from, to) in table {
            match (fold_char(from), fold_char(to)) {
                (Some(from), Some(to)) => {
                    folded.insert(from, to);
                }
                _ => tracing::warn!(
                    "Skipping substitution {:?} -> {:?}: not a single character after folding",
                    from,
                    to
                ),
            }
        }

        let chained: Vec<char> = folded
            .iter()
            .filter(|(from, to)| from != to && folded.contains_key(*to))
            .map(|(from, _)| *from)
            .collect();
        for from in chained {
            tracing::warn!(
                "Skipping substitution for {:?}: its target is itself substituted",
                from
            );
            folded.remove(&from);
        }

        Self {
            substitutions: folded,
        }
    }

    /// Normalize text for matching. Total over any input; `""` stays `""`.
    pub fn normalize(&self, raw: &str) -> String {
        let folded: String = raw
            .to_lowercase()
            .nfd()
            .filter(|c| !is_combining_mark(*c))
            .map(|c| self.substitutions.get(&c).copied().unwrap_or(c))
            .map(|c| {
                if c.is_alphanumeric() || c.is_whitespace() {
                    c
                } else {
                    ' '
                }
            })
            .collect();

        folded.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSTITUTIONS.iter().copied())
    }
}

/// Lowercase + strip marks for a single table entry.
fn fold_char(c: char) -> Option<char> {
    let mut folded = c
        .to_lowercase()
        .collect::<String>()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<Vec<char>>();

    if folded.len() == 1 {
        folded.pop()
    } else {
        None
    }
}
