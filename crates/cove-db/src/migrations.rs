use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS channels (
            id              TEXT PRIMARY KEY,
            workspace_id    TEXT NOT NULL,
            name            TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_channels_workspace
            ON channels(workspace_id);

        -- Author fields are a snapshot taken at creation time; they are
        -- never re-joined against a live profile.
        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            channel_id      TEXT NOT NULL REFERENCES channels(id),
            thread_id       TEXT REFERENCES messages(id),
            content         TEXT NOT NULL,
            image_url       TEXT,
            author_id       TEXT NOT NULL,
            author_name     TEXT NOT NULL,
            author_email    TEXT NOT NULL,
            author_avatar   TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_channel
            ON messages(channel_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_messages_thread
            ON messages(thread_id);

        -- The uniqueness constraint is what makes reaction toggling safe
        -- under concurrent duplicate toggles: the second insert is skipped
        -- and resolves to a delete.
        CREATE TABLE IF NOT EXISTS reactions (
            id              TEXT PRIMARY KEY,
            message_id      TEXT NOT NULL REFERENCES messages(id),
            user_id         TEXT NOT NULL,
            user_name       TEXT NOT NULL,
            user_email      TEXT NOT NULL,
            user_avatar     TEXT NOT NULL,
            emoji           TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            UNIQUE(message_id, user_id, emoji)
        );

        CREATE INDEX IF NOT EXISTS idx_reactions_message
            ON reactions(message_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
