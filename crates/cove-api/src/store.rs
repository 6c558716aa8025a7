use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;
use uuid::Uuid;

use cove_db::Database;
use cove_db::models::{MessageRow, ReactionRow};
use cove_types::api::{
    Claims, CreateMessageRequest, MessageItem, Page, ThreadView, ToggleReactionResponse,
    UpdateMessageResponse,
};

use crate::aggregate::group_reactions;
use crate::error::ApiError;

pub const DEFAULT_PAGE_LIMIT: u32 = 30;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Tenant-scoped persistence operations over messages and reactions.
///
/// Every operation resolves entities through the caller's workspace org
/// code; rows belonging to another workspace behave as absent. Handlers
/// call these methods inside `spawn_blocking` since rusqlite is synchronous.
#[derive(Clone)]
pub struct MessageStore {
    db: Arc<Database>,
}

impl MessageStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a root message or a thread reply.
    ///
    /// The author's display fields are denormalized onto the row at creation
    /// time: the message keeps showing who the author was when they wrote
    /// it, even if their profile changes later.
    pub fn create(
        &self,
        channel_id: &str,
        req: &CreateMessageRequest,
        author: &Claims,
    ) -> Result<MessageItem, ApiError> {
        self.db
            .find_channel(channel_id, &author.org)?
            .ok_or(ApiError::Forbidden)?;

        if let Some(thread_id) = &req.thread_id {
            let parent = self.db.find_message_in_workspace(thread_id, &author.org)?;

            // The parent must be a root message of the same channel. A reply
            // to a reply would nest threads beyond one level.
            match parent {
                Some(p) if p.channel_id == channel_id && p.thread_id.is_none() => {}
                _ => return Err(ApiError::BadRequest),
            }
        }

        let now = now_rfc3339();
        let row = MessageRow {
            id: Uuid::new_v4().to_string(),
            channel_id: channel_id.to_string(),
            thread_id: req.thread_id.clone(),
            content: req.content.clone(),
            image_url: req.image_url.clone(),
            author_id: author.sub.clone(),
            author_name: author.name.clone(),
            author_email: author.email.clone(),
            author_avatar: author.avatar.clone(),
            created_at: now.clone(),
            updated_at: now,
        };

        self.db.insert_message(&row)?;

        Ok(to_item(row, 0, vec![]))
    }

    /// Edit a message's content. Only the original author may edit, and only
    /// the content is mutable.
    pub fn update(
        &self,
        message_id: &str,
        content: &str,
        author: &Claims,
    ) -> Result<UpdateMessageResponse, ApiError> {
        let mut row = self
            .db
            .find_message_in_workspace(message_id, &author.org)?
            .ok_or(ApiError::NotFound)?;

        if row.author_id != author.sub {
            return Err(ApiError::Forbidden);
        }

        let now = now_rfc3339();
        self.db.update_message_content(message_id, content, &now)?;

        row.content = content.to_string();
        row.updated_at = now;

        let can_edit = row.author_id == author.sub;
        let message = self
            .enrich(vec![row], &author.sub)?
            .pop()
            .ok_or(ApiError::NotFound)?;

        Ok(UpdateMessageResponse { message, can_edit })
    }

    /// Root messages of a channel, newest first, keyset-paginated.
    ///
    /// `next_cursor` is present iff the page came back full. When the
    /// remaining total equals the limit exactly this produces one extra
    /// empty fetch, which is accepted.
    ///
    /// A limit of zero is rejected as `BadRequest`; a limit over the cap is
    /// quietly capped at 100.
    pub fn list_root(
        &self,
        channel_id: &str,
        cursor: Option<&str>,
        limit: Option<u32>,
        viewer: &Claims,
    ) -> Result<Page, ApiError> {
        self.db
            .find_channel(channel_id, &viewer.org)?
            .ok_or(ApiError::Forbidden)?;

        let limit = match limit {
            Some(0) => return Err(ApiError::BadRequest),
            Some(n) => n.min(MAX_PAGE_LIMIT),
            None => DEFAULT_PAGE_LIMIT,
        };
        let rows = self.db.list_root_messages(channel_id, limit, cursor)?;

        let next_cursor = if rows.len() as u32 == limit {
            rows.last().map(|r| r.id.clone())
        } else {
            None
        };

        let items = self.enrich(rows, &viewer.sub)?;

        Ok(Page { items, next_cursor })
    }

    /// The enriched root message plus its replies, oldest first.
    /// Replies are unpaginated; threads are assumed modest in size.
    pub fn list_thread(&self, message_id: &str, viewer: &Claims) -> Result<ThreadView, ApiError> {
        let parent_row = self
            .db
            .find_message_in_workspace(message_id, &viewer.org)?
            .ok_or(ApiError::NotFound)?;

        let reply_rows = self.db.list_thread_replies(message_id)?;

        let mut rows = Vec::with_capacity(1 + reply_rows.len());
        rows.push(parent_row);
        rows.extend(reply_rows);

        let mut enriched = self.enrich(rows, &viewer.sub)?;
        let messages = enriched.split_off(1);
        let parent = enriched.pop().ok_or(ApiError::NotFound)?;

        Ok(ThreadView { parent, messages })
    }

    /// Toggle the viewer's reaction on a message and return the fresh
    /// per-emoji aggregates.
    pub fn toggle_reaction(
        &self,
        message_id: &str,
        emoji: &str,
        viewer: &Claims,
    ) -> Result<ToggleReactionResponse, ApiError> {
        self.db
            .find_message_in_workspace(message_id, &viewer.org)?
            .ok_or(ApiError::NotFound)?;

        self.db.toggle_reaction(
            &Uuid::new_v4().to_string(),
            message_id,
            &viewer.sub,
            &viewer.name,
            &viewer.email,
            &viewer.avatar,
            emoji,
            &now_rfc3339(),
        )?;

        let rows = self
            .db
            .reactions_for_messages(std::slice::from_ref(&message_id.to_string()))?;
        let reactions = group_reactions(&rows, &viewer.sub);

        Ok(ToggleReactionResponse {
            message_id: message_id.to_string(),
            reactions,
        })
    }

    /// Batch-enrich rows with reply counts and grouped reactions, preserving
    /// the input order.
    fn enrich(&self, rows: Vec<MessageRow>, viewer: &str) -> Result<Vec<MessageItem>, ApiError> {
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();

        let reply_counts = self.db.reply_counts(&ids)?;
        let reaction_rows = self.db.reactions_for_messages(&ids)?;

        // Partition reactions by message, keeping the per-message insertion
        // order the query already established.
        let mut by_message: HashMap<String, Vec<ReactionRow>> = HashMap::new();
        for r in reaction_rows {
            by_message.entry(r.message_id.clone()).or_default().push(r);
        }

        let items = rows
            .into_iter()
            .map(|row| {
                let replies = reply_counts.get(&row.id).copied().unwrap_or(0);
                let reactions = by_message
                    .get(&row.id)
                    .map(|rs| group_reactions(rs, viewer))
                    .unwrap_or_default();
                to_item(row, replies, reactions)
            })
            .collect();

        Ok(items)
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_item(
    row: MessageRow,
    reply_count: u64,
    reactions: Vec<cove_types::api::GroupedReaction>,
) -> MessageItem {
    MessageItem {
        created_at: parse_timestamp(&row.created_at, &row.id),
        updated_at: parse_timestamp(&row.updated_at, &row.id),
        id: row.id,
        channel_id: row.channel_id,
        thread_id: row.thread_id,
        content: row.content,
        image_url: row.image_url,
        author_id: row.author_id,
        author_name: row.author_name,
        author_email: row.author_email,
        author_avatar: row.author_avatar,
        reply_count,
        reactions,
    }
}

fn parse_timestamp(raw: &str, message_id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>().unwrap_or_else(|e| {
        warn!("Corrupt timestamp '{}' on message '{}': {}", raw, message_id, e);
        DateTime::default()
    })
}
