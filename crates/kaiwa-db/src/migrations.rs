use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS profiles (
            id              TEXT PRIMARY KEY,
            username        TEXT NOT NULL UNIQUE,
            display_name    TEXT,
            avatar_url      TEXT,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        -- Participant columns hold the unordered pair in canonical order:
        -- participant_one_id sorts below participant_two_id, which makes the
        -- UNIQUE constraint cover both orientations of the same pair.
        CREATE TABLE IF NOT EXISTS conversations (
            id                  TEXT PRIMARY KEY,
            participant_one_id  TEXT NOT NULL REFERENCES profiles(id),
            participant_two_id  TEXT NOT NULL REFERENCES profiles(id),
            created_at          TEXT NOT NULL,
            last_message_at     TEXT NOT NULL,
            UNIQUE(participant_one_id, participant_two_id),
            CHECK(participant_one_id < participant_two_id)
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_one
            ON conversations(participant_one_id, last_message_at);

        CREATE INDEX IF NOT EXISTS idx_conversations_two
            ON conversations(participant_two_id, last_message_at);

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL REFERENCES conversations(id),
            sender_id       TEXT NOT NULL REFERENCES profiles(id),
            recipient_id    TEXT NOT NULL REFERENCES profiles(id),
            content         TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            read_at         TEXT,
            CHECK(length(content) > 0),
            CHECK(sender_id <> recipient_id)
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON messages(conversation_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_messages_unread
            ON messages(conversation_id, recipient_id)
            WHERE read_at IS NULL;
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
