use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Owned by the identity provider; this service only reads it.
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            role            TEXT NOT NULL CHECK (role IN ('tenant', 'landlord')),
            display_name    TEXT NOT NULL,
            photo_url       TEXT,
            verified        INTEGER NOT NULL DEFAULT 0,
            bio             TEXT,
            budget_cents    INTEGER,
            company         TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Owned by the listing service; this service only reads it.
        CREATE TABLE IF NOT EXISTS listings (
            id              TEXT PRIMARY KEY,
            owner_id        TEXT NOT NULL REFERENCES users(id),
            title           TEXT NOT NULL,
            price_cents     INTEGER NOT NULL,
            city            TEXT NOT NULL,
            bedrooms        INTEGER NOT NULL DEFAULT 1,
            photo_url       TEXT,
            active          INTEGER NOT NULL DEFAULT 1,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS likes (
            id          TEXT PRIMARY KEY,
            side        TEXT NOT NULL CHECK (side IN ('tenant', 'landlord')),
            tenant_id   TEXT NOT NULL,
            listing_id  TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(side, tenant_id, listing_id)
        );

        CREATE TABLE IF NOT EXISTS matches (
            id          TEXT PRIMARY KEY,
            tenant_id   TEXT NOT NULL,
            landlord_id TEXT NOT NULL,
            listing_id  TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(tenant_id, listing_id)
        );

        CREATE INDEX IF NOT EXISTS idx_matches_tenant
            ON matches(tenant_id);
        CREATE INDEX IF NOT EXISTS idx_matches_landlord
            ON matches(landlord_id);

        -- participant1 < participant2 (canonical pair order) is what makes
        -- the UNIQUE constraint cover both argument orders.
        CREATE TABLE IF NOT EXISTS conversations (
            id              TEXT PRIMARY KEY,
            participant1    TEXT NOT NULL,
            participant2    TEXT NOT NULL,
            last_message_id TEXT,
            last_message_at TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(participant1, participant2),
            CHECK (participant1 < participant2)
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_p1
            ON conversations(participant1);
        CREATE INDEX IF NOT EXISTS idx_conversations_p2
            ON conversations(participant2);

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL REFERENCES conversations(id),
            sender_id       TEXT NOT NULL,
            receiver_id     TEXT NOT NULL,
            content         TEXT NOT NULL,
            is_read         INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON messages(conversation_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_messages_unread
            ON messages(conversation_id, receiver_id, is_read);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
