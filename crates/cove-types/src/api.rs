use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// JWT claims shared between cove-api (REST middleware) and cove-client
/// (optimistic author snapshots). Canonical definition lives here in
/// cove-types to eliminate duplication.
///
/// `sub` is the identity provider's opaque user id, `org` is the workspace
/// org code used for tenant scoping. The display fields are denormalized
/// onto messages at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub org: String,
    pub exp: usize,
}

// -- Messages --

/// A fully enriched message as returned by every read path: the persisted
/// columns plus the derived `reply_count` and grouped reactions.
///
/// `id` is a String rather than a Uuid because the client cache holds
/// provisional entries under an `optimistic-` namespaced id until the
/// server confirms them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageItem {
    pub id: String,
    pub channel_id: String,
    /// Non-null marks this message as a thread reply; the referenced
    /// message is always a root (its own `thread_id` is null).
    pub thread_id: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub author_id: String,
    pub author_name: String,
    pub author_email: String,
    pub author_avatar: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub reply_count: u64,
    pub reactions: Vec<GroupedReaction>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMessageRequest {
    pub content: String,
    pub image_url: Option<String>,
    /// Root message id when this is a thread reply.
    pub thread_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateMessageResponse {
    pub message: MessageItem,
    pub can_edit: bool,
}

/// One cursor page of sibling messages, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<MessageItem>,
    /// Present iff the page came back full; the id of the last item,
    /// passed back verbatim to fetch the next (older) page.
    pub next_cursor: Option<String>,
}

/// A thread: the enriched root plus its replies, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadView {
    pub parent: MessageItem,
    pub messages: Vec<MessageItem>,
}

// -- Reactions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleReactionRequest {
    pub emoji: String,
}

/// Per-emoji aggregate for one message, computed for a specific viewer.
/// Never persisted; always derived fresh from raw reaction rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedReaction {
    pub emoji: String,
    pub count: u64,
    pub reacted_by_me: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleReactionResponse {
    pub message_id: String,
    pub reactions: Vec<GroupedReaction>,
}
