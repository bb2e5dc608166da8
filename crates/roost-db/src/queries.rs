use crate::Database;
use crate::models::{ConversationRow, ListingRow, MatchRow, MessageRow, UserRow};
use anyhow::Result;
use rusqlite::Row;

impl Database {
    // -- Users (read side of the identity store) --

    /// Writes a user row. The identity provider owns this table; the
    /// coordination core never calls this. It exists for provisioning
    /// and tests.
    pub fn create_user(&self, row: &UserRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, role, display_name, photo_url, verified, bio, budget_cents, company)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    row.id,
                    row.role,
                    row.display_name,
                    row.photo_url,
                    row.verified,
                    row.bio,
                    row.budget_cents,
                    row.company,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, role, display_name, photo_url, verified, bio, budget_cents, company, created_at
                 FROM users WHERE id = ?1",
            )?;
            stmt.query_row([id], read_user).optional()
        })
    }

    // -- Listings (read side of the listing store) --

    /// Same deal as `create_user`: provisioning/tests only.
    pub fn create_listing(&self, row: &ListingRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO listings (id, owner_id, title, price_cents, city, bedrooms, photo_url, active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    row.id,
                    row.owner_id,
                    row.title,
                    row.price_cents,
                    row.city,
                    row.bedrooms,
                    row.photo_url,
                    row.active,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_listing(&self, id: &str) -> Result<Option<ListingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, title, price_cents, city, bedrooms, photo_url, active, created_at
                 FROM listings WHERE id = ?1",
            )?;
            stmt.query_row([id], read_listing).optional()
        })
    }

    // -- Conversations --

    /// Lookup by canonical pair. Callers must pass `p1 < p2`.
    pub fn find_conversation_id(&self, p1: &str, p2: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id FROM conversations WHERE participant1 = ?1 AND participant2 = ?2",
                [p1, p2],
                |row| row.get(0),
            )
            .optional()
        })
    }

    /// Race-safe half of get-or-create: the UNIQUE(participant1,
    /// participant2) constraint arbitrates concurrent inserts, and the
    /// loser's row is simply ignored. Callers re-read after this.
    pub fn insert_conversation_if_absent(&self, id: &str, p1: &str, p2: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO conversations (id, participant1, participant2) VALUES (?1, ?2, ?3)",
                [id, p1, p2],
            )?;
            Ok(())
        })
    }

    pub fn get_conversation(&self, id: &str) -> Result<Option<ConversationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, participant1, participant2, last_message_id, last_message_at, created_at, updated_at
                 FROM conversations WHERE id = ?1",
            )?;
            stmt.query_row([id], read_conversation).optional()
        })
    }

    /// All conversations the user participates in, most recent activity
    /// first (conversations that never got a message sort by creation).
    pub fn list_conversations_for_user(&self, user_id: &str) -> Result<Vec<ConversationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, participant1, participant2, last_message_id, last_message_at, created_at, updated_at
                 FROM conversations
                 WHERE participant1 = ?1 OR participant2 = ?1
                 ORDER BY COALESCE(last_message_at, created_at) DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id], read_conversation)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Messages --

    /// Appends a message and refreshes the parent conversation's
    /// last-message pointer in one transaction, then returns the stored
    /// row (so callers see the database's own timestamps).
    pub fn append_message(
        &self,
        id: &str,
        conversation_id: &str,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
    ) -> Result<MessageRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO messages (id, conversation_id, sender_id, receiver_id, content)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                [id, conversation_id, sender_id, receiver_id, content],
            )?;
            tx.execute(
                "UPDATE conversations
                 SET last_message_id = ?2,
                     last_message_at = (SELECT created_at FROM messages WHERE id = ?2),
                     updated_at = datetime('now')
                 WHERE id = ?1",
                [conversation_id, id],
            )?;
            let row = tx.query_row(
                "SELECT id, conversation_id, sender_id, receiver_id, content, is_read, created_at, updated_at
                 FROM messages WHERE id = ?1",
                [id],
                read_message,
            )?;
            tx.commit()?;
            Ok(row)
        })
    }

    /// The `limit` most recent messages, returned oldest first.
    /// Ordering is creation time with rowid as the insertion-order
    /// tie-break (datetime('now') only has second resolution).
    pub fn get_messages(&self, conversation_id: &str, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, sender_id, receiver_id, content, is_read, created_at, updated_at
                 FROM messages
                 WHERE conversation_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2",
            )?;
            let mut rows = stmt
                .query_map(rusqlite::params![conversation_id, limit], read_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.reverse();
            Ok(rows)
        })
    }

    pub fn last_message(&self, conversation_id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, sender_id, receiver_id, content, is_read, created_at, updated_at
                 FROM messages
                 WHERE conversation_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT 1",
            )?;
            stmt.query_row([conversation_id], read_message).optional()
        })
    }

    /// Flips unread → read for everything addressed to `reader_id` in
    /// the conversation. Returns how many rows changed, so a repeat call
    /// reports 0.
    pub fn mark_messages_read(&self, conversation_id: &str, reader_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE messages
                 SET is_read = 1, updated_at = datetime('now')
                 WHERE conversation_id = ?1 AND receiver_id = ?2 AND is_read = 0",
                [conversation_id, reader_id],
            )?;
            Ok(changed)
        })
    }

    pub fn unread_count(&self, conversation_id: &str, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM messages
                 WHERE conversation_id = ?1 AND receiver_id = ?2 AND is_read = 0",
                [conversation_id, user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    // -- Likes --

    /// Records an interest signal. Returns false when the identical
    /// swipe was already on file (repeat swipes are idempotent).
    pub fn insert_like_if_absent(
        &self,
        id: &str,
        side: &str,
        tenant_id: &str,
        listing_id: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO likes (id, side, tenant_id, listing_id) VALUES (?1, ?2, ?3, ?4)",
                [id, side, tenant_id, listing_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn has_like(&self, side: &str, tenant_id: &str, listing_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM likes WHERE side = ?1 AND tenant_id = ?2 AND listing_id = ?3",
                    [side, tenant_id, listing_id],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    // -- Matches --

    /// UNIQUE(tenant_id, listing_id) arbitrates concurrent derivation;
    /// callers re-read by pair to learn which row won. Returns false
    /// when the pair already had a match.
    pub fn insert_match_if_absent(
        &self,
        id: &str,
        tenant_id: &str,
        landlord_id: &str,
        listing_id: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO matches (id, tenant_id, landlord_id, listing_id) VALUES (?1, ?2, ?3, ?4)",
                [id, tenant_id, landlord_id, listing_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn find_match_by_pair(&self, tenant_id: &str, listing_id: &str) -> Result<Option<MatchRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, tenant_id, landlord_id, listing_id, created_at
                 FROM matches WHERE tenant_id = ?1 AND listing_id = ?2",
            )?;
            stmt.query_row([tenant_id, listing_id], read_match).optional()
        })
    }

    pub fn get_match(&self, id: &str) -> Result<Option<MatchRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, tenant_id, landlord_id, listing_id, created_at
                 FROM matches WHERE id = ?1",
            )?;
            stmt.query_row([id], read_match).optional()
        })
    }

    /// Matches the user participates in, stable insertion order. No
    /// ranking is applied anywhere.
    pub fn list_matches_for_user(&self, user_id: &str) -> Result<Vec<MatchRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, tenant_id, landlord_id, listing_id, created_at
                 FROM matches
                 WHERE tenant_id = ?1 OR landlord_id = ?1
                 ORDER BY rowid ASC",
            )?;
            let rows = stmt
                .query_map([user_id], read_match)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

// -- Row mappers --

fn read_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        role: row.get(1)?,
        display_name: row.get(2)?,
        photo_url: row.get(3)?,
        verified: row.get(4)?,
        bio: row.get(5)?,
        budget_cents: row.get(6)?,
        company: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn read_listing(row: &Row<'_>) -> rusqlite::Result<ListingRow> {
    Ok(ListingRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        price_cents: row.get(3)?,
        city: row.get(4)?,
        bedrooms: row.get(5)?,
        photo_url: row.get(6)?,
        active: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn read_conversation(row: &Row<'_>) -> rusqlite::Result<ConversationRow> {
    Ok(ConversationRow {
        id: row.get(0)?,
        participant1: row.get(1)?,
        participant2: row.get(2)?,
        last_message_id: row.get(3)?,
        last_message_at: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn read_message(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender_id: row.get(2)?,
        receiver_id: row.get(3)?,
        content: row.get(4)?,
        is_read: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn read_match(row: &Row<'_>) -> rusqlite::Result<MatchRow> {
    Ok(MatchRow {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        landlord_id: row.get(2)?,
        listing_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
