// Core moderation module - the auto-moderation decision engine.
// Leaf pieces first, the engine that ties them together last.

pub mod moderation_engine;
pub mod moderation_models;
pub mod permission_gate;
pub mod profanity_matcher;
pub mod spam_tracker;
pub mod text_normalizer;

pub use moderation_engine::*;
pub use moderation_models::*;
pub use permission_gate::PermissionGate;
pub use spam_tracker::SpamTracker;
