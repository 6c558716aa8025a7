/// Database row types — these map directly to SQLite rows.
/// Distinct from the cove-types API models to keep the DB layer independent.

pub struct ChannelRow {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub channel_id: String,
    pub thread_id: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub author_id: String,
    pub author_name: String,
    pub author_email: String,
    pub author_avatar: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct ReactionRow {
    pub message_id: String,
    pub user_id: String,
    pub emoji: String,
}
