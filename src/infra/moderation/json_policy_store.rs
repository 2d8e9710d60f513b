// JSON-file policy source for the profanity filter.
//
// File shape (both keys optional, missing ones fall back to the built-ins):
// {
//   "forbidden_terms": ["connard", "fuck"],
//   "substitutions": { "@": "a", "$": "s" }
// }

use crate::core::moderation::{ModerationPolicy, PolicyError, PolicyStore};
use async_trait::async_trait;
use std::path::PathBuf;

pub struct JsonPolicyStore {
    path: PathBuf,
}

impl JsonPolicyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PolicyStore for JsonPolicyStore {
    async fn load_policy(&self) -> Result<ModerationPolicy, PolicyError> {
        if !self.path.exists() {
            tracing::info!(
                "No moderation policy at {}, using built-in word list",
                self.path.display()
            );
            return Ok(ModerationPolicy::default());
        }

        let file = std::fs::File::open(&self.path)?;
        let policy: ModerationPolicy = serde_json::from_reader(file)?;

        if policy.forbidden_terms.iter().all(|t| t.trim().is_empty()) {
            return Err(PolicyError::Invalid(format!(
                "{} has no forbidden terms",
                self.path.display()
            )));
        }

        tracing::info!(
            terms = policy.forbidden_terms.len(),
            substitutions = policy.substitutions.len(),
            "Loaded moderation policy from {}",
            self.path.display()
        );
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_missing_file_uses_builtin_policy() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonPolicyStore::new(dir.path().join("nope.json"));

        let policy = store.load_policy().await.unwrap();

        assert_eq!(policy, ModerationPolicy::default());
    }

    #[tokio::test]
    async fn test_loads_terms_and_keeps_default_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "forbidden_terms": ["crétin", "idiot"] }}"#).unwrap();

        let policy = JsonPolicyStore::new(file.path()).load_policy().await.unwrap();

        assert_eq!(policy.forbidden_terms, vec!["crétin", "idiot"]);
        assert_eq!(
            policy.substitutions,
            ModerationPolicy::default().substitutions
        );
    }

    #[tokio::test]
    async fn test_loads_custom_substitutions() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "forbidden_terms": ["idiot"], "substitutions": {{ "1": "i", "0": "o" }} }}"#
        )
        .unwrap();

        let policy = JsonPolicyStore::new(file.path()).load_policy().await.unwrap();

        assert_eq!(policy.substitutions.len(), 2);
        assert_eq!(policy.substitutions.get(&'1'), Some(&'i'));
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let result = JsonPolicyStore::new(file.path()).load_policy().await;

        assert!(matches!(result, Err(PolicyError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_empty_term_list_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "forbidden_terms": ["  "] }}"#).unwrap();

        let result = JsonPolicyStore::new(file.path()).load_policy().await;

        assert!(matches!(result, Err(PolicyError::Invalid(_))));
    }
}
