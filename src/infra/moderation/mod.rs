// Implementations for the moderation system.

pub mod json_policy_store;

pub use json_policy_store::JsonPolicyStore;
