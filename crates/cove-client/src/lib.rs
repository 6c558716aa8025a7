pub mod cache;
pub mod reconcile;

pub use cache::{MessageCache, Snapshot, View, ViewKey};
pub use reconcile::{MessageDraft, MutationContext, Notice, Profile, ReactionTarget};
