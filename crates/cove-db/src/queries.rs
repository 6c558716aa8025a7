use std::collections::HashMap;

use crate::Database;
use crate::models::{ChannelRow, MessageRow, ReactionRow};
use anyhow::Result;
use rusqlite::OptionalExtension;

const MESSAGE_COLUMNS: &str = "id, channel_id, thread_id, content, image_url, \
     author_id, author_name, author_email, author_avatar, created_at, updated_at";

impl Database {
    // -- Channels --

    pub fn create_channel(&self, id: &str, workspace_id: &str, name: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO channels (id, workspace_id, name) VALUES (?1, ?2, ?3)",
                (id, workspace_id, name),
            )?;
            Ok(())
        })
    }

    /// Resolve a channel within a workspace. A channel belonging to a
    /// different workspace comes back as `None`, same as a missing one.
    pub fn find_channel(&self, channel_id: &str, workspace_id: &str) -> Result<Option<ChannelRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, workspace_id, name FROM channels
                     WHERE id = ?1 AND workspace_id = ?2",
                    (channel_id, workspace_id),
                    |row| {
                        Ok(ChannelRow {
                            id: row.get(0)?,
                            workspace_id: row.get(1)?,
                            name: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, msg: &MessageRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, channel_id, thread_id, content, image_url,
                     author_id, author_name, author_email, author_avatar, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    msg.id,
                    msg.channel_id,
                    msg.thread_id,
                    msg.content,
                    msg.image_url,
                    msg.author_id,
                    msg.author_name,
                    msg.author_email,
                    msg.author_avatar,
                    msg.created_at,
                    msg.updated_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_message(&self, id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1");
            let row = conn
                .query_row(&sql, [id], map_message_row)
                .optional()?;
            Ok(row)
        })
    }

    /// Look up a message through its channel's workspace. Messages outside
    /// the workspace behave as absent so tenant boundaries never leak
    /// existence.
    pub fn find_message_in_workspace(
        &self,
        message_id: &str,
        workspace_id: &str,
    ) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM messages m
                 JOIN channels c ON m.channel_id = c.id
                 WHERE m.id = ?1 AND c.workspace_id = ?2",
                qualified_message_columns()
            );
            let row = conn
                .query_row(&sql, (message_id, workspace_id), map_message_row)
                .optional()?;
            Ok(row)
        })
    }

    /// Root messages of a channel, newest first, keyset-paginated.
    ///
    /// Ordering is `(created_at DESC, id DESC)` — the id tie-break makes the
    /// order total under equal timestamps. The cursor is the id of the last
    /// message of the previous page; it is excluded from the result.
    ///
    /// The anchor lookup is scoped to root messages of this channel. A
    /// cursor naming anything else — an unknown id, a reply, or a message
    /// from another channel (hence possibly another workspace) — yields an
    /// empty page, indistinguishably, so a probing caller learns nothing
    /// about rows outside their tenant.
    pub fn list_root_messages(
        &self,
        channel_id: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let anchor = match cursor {
                Some(id) => {
                    let found: Option<(String, String)> = conn
                        .query_row(
                            "SELECT created_at, id FROM messages
                             WHERE id = ?1 AND channel_id = ?2 AND thread_id IS NULL",
                            (id, channel_id),
                            |row| Ok((row.get(0)?, row.get(1)?)),
                        )
                        .optional()?;
                    match found {
                        Some(a) => Some(a),
                        None => return Ok(vec![]),
                    }
                }
                None => None,
            };

            match anchor {
                Some((created_at, id)) => {
                    let sql = format!(
                        "SELECT {MESSAGE_COLUMNS} FROM messages
                         WHERE channel_id = ?1 AND thread_id IS NULL
                           AND (created_at < ?2 OR (created_at = ?2 AND id < ?3))
                         ORDER BY created_at DESC, id DESC
                         LIMIT ?4"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt
                        .query_map(
                            rusqlite::params![channel_id, created_at, id, limit],
                            map_message_row,
                        )?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    Ok(rows)
                }
                None => {
                    let sql = format!(
                        "SELECT {MESSAGE_COLUMNS} FROM messages
                         WHERE channel_id = ?1 AND thread_id IS NULL
                         ORDER BY created_at DESC, id DESC
                         LIMIT ?2"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt
                        .query_map(rusqlite::params![channel_id, limit], map_message_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    Ok(rows)
                }
            }
        })
    }

    /// Replies of a thread, oldest first. Unpaginated: threads are assumed
    /// modest in size.
    pub fn list_thread_replies(&self, thread_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE thread_id = ?1
                 ORDER BY created_at ASC, id ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([thread_id], map_message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_message_content(&self, id: &str, content: &str, updated_at: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE messages SET content = ?2, updated_at = ?3 WHERE id = ?1",
                (id, content, updated_at),
            )?;
            Ok(())
        })
    }

    /// Batch-fetch reply counts for a set of root message ids.
    pub fn reply_counts(&self, message_ids: &[String]) -> Result<HashMap<String, u64>> {
        if message_ids.is_empty() {
            return Ok(HashMap::new());
        }

        self.with_conn(|conn| {
            let placeholders = placeholders(message_ids.len());
            let sql = format!(
                "SELECT thread_id, COUNT(*) FROM messages
                 WHERE thread_id IN ({placeholders})
                 GROUP BY thread_id"
            );

            let mut stmt = conn.prepare(&sql)?;
            let params = as_sql_params(message_ids);
            let counts = stmt
                .query_map(params.as_slice(), |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
                })?
                .collect::<std::result::Result<HashMap<_, _>, _>>()?;

            Ok(counts)
        })
    }

    // -- Reactions --

    /// Toggle a reaction. Insert-first: `INSERT OR IGNORE` against the
    /// `(message_id, user_id, emoji)` uniqueness constraint, and only when
    /// the insert was skipped delete the existing row. Two near-simultaneous
    /// duplicate toggles therefore resolve deterministically — one insert
    /// wins, the other deletes — instead of racing a read-then-branch.
    ///
    /// Returns true when the reaction was added, false when removed.
    #[allow(clippy::too_many_arguments)]
    pub fn toggle_reaction(
        &self,
        id: &str,
        message_id: &str,
        user_id: &str,
        user_name: &str,
        user_email: &str,
        user_avatar: &str,
        emoji: &str,
        created_at: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO reactions
                     (id, message_id, user_id, user_name, user_email, user_avatar, emoji, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    id, message_id, user_id, user_name, user_email, user_avatar, emoji, created_at
                ],
            )?;

            if inserted == 0 {
                conn.execute(
                    "DELETE FROM reactions WHERE message_id = ?1 AND user_id = ?2 AND emoji = ?3",
                    (message_id, user_id, emoji),
                )?;
                Ok(false)
            } else {
                Ok(true)
            }
        })
    }

    /// Batch-fetch reactions for a set of message ids, in insertion order so
    /// aggregation produces a stable first-appearance emoji ordering.
    pub fn reactions_for_messages(&self, message_ids: &[String]) -> Result<Vec<ReactionRow>> {
        if message_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders = placeholders(message_ids.len());
            let sql = format!(
                "SELECT message_id, user_id, emoji FROM reactions
                 WHERE message_id IN ({placeholders})
                 ORDER BY created_at ASC, id ASC"
            );

            let mut stmt = conn.prepare(&sql)?;
            let params = as_sql_params(message_ids);
            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(ReactionRow {
                        message_id: row.get(0)?,
                        user_id: row.get(1)?,
                        emoji: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn qualified_message_columns() -> String {
    MESSAGE_COLUMNS
        .split(", ")
        .map(|c| format!("m.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn placeholders(n: usize) -> String {
    (1..=n)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn as_sql_params(ids: &[String]) -> Vec<&dyn rusqlite::types::ToSql> {
    ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect()
}

fn map_message_row(row: &rusqlite::Row<'_>) -> std::result::Result<MessageRow, rusqlite::Error> {
    Ok(MessageRow {
        id: row.get(0)?,
        channel_id: row.get(1)?,
        thread_id: row.get(2)?,
        content: row.get(3)?,
        image_url: row.get(4)?,
        author_id: row.get(5)?,
        author_name: row.get(6)?,
        author_email: row.get(7)?,
        author_avatar: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
