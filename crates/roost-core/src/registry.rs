use std::sync::Arc;

use roost_db::Database;
use roost_types::models::{Conversation, ConversationSummary};
use tracing::warn;
use uuid::Uuid;

use crate::{Unavailable, run_store};

/// Owns the one-thread-per-pair invariant: every (tenant, landlord) pair
/// maps to at most one conversation row, no matter how often or in which
/// argument order callers ask.
#[derive(Clone)]
pub struct ConversationRegistry {
    db: Arc<Database>,
}

impl ConversationRegistry {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Canonical storage order for a participant pair. `Uuid`'s byte
    /// order coincides with the lexicographic order of the lowercase
    /// hyphenated text form the database stores, so this comparison and
    /// the table's CHECK constraint agree.
    pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
        if a <= b { (a, b) } else { (b, a) }
    }

    /// Returns the id of the pair's conversation, creating the row on
    /// first contact. Concurrent callers converge on the same row: the
    /// UNIQUE constraint over the canonical pair arbitrates, and the
    /// re-read after `INSERT OR IGNORE` picks up whichever insert won.
    pub async fn get_or_create(&self, user_a: Uuid, user_b: Uuid) -> Result<Uuid, Unavailable> {
        if user_a == user_b || user_a.is_nil() || user_b.is_nil() {
            warn!("Rejecting conversation between {} and {}", user_a, user_b);
            return Err(Unavailable);
        }
        let (p1, p2) = Self::canonical_pair(user_a, user_b);

        let db = self.db.clone();
        run_store("conversation get-or-create", move || {
            let p1 = p1.to_string();
            let p2 = p2.to_string();
            if let Some(existing) = db.find_conversation_id(&p1, &p2)? {
                return Ok(Uuid::parse_str(&existing)?);
            }
            db.insert_conversation_if_absent(&Uuid::new_v4().to_string(), &p1, &p2)?;
            let id = db
                .find_conversation_id(&p1, &p2)?
                .ok_or_else(|| anyhow::anyhow!("conversation row missing after insert"))?;
            Ok(Uuid::parse_str(&id)?)
        })
        .await
    }

    /// Typed lookup used by send and subscribe availability checks.
    pub async fn find(&self, conversation_id: Uuid) -> Option<Conversation> {
        let db = self.db.clone();
        run_store("conversation lookup", move || {
            db.get_conversation(&conversation_id.to_string())
        })
        .await
        .ok()
        .flatten()
        .and_then(|row| row.to_conversation())
    }

    /// The user's conversation list, most recent activity first. Rows
    /// whose peer profile does not resolve are dropped rather than
    /// returned half-filled.
    pub async fn list_for_user(&self, user_id: Uuid) -> Vec<ConversationSummary> {
        let db = self.db.clone();
        run_store("conversation list", move || {
            let uid = user_id.to_string();
            let rows = db.list_conversations_for_user(&uid)?;
            let mut summaries = Vec::with_capacity(rows.len());
            for row in rows {
                let Some(conversation) = row.to_conversation() else {
                    continue;
                };
                let Some(peer_id) = conversation.peer_of(user_id) else {
                    warn!(
                        "Conversation {} listed for non-participant {}",
                        conversation.id, user_id
                    );
                    continue;
                };
                let peer = db
                    .get_user(&peer_id.to_string())?
                    .and_then(|user| user.normalize());
                let Some(peer) = peer else {
                    warn!(
                        "Dropping conversation {}: peer {} does not resolve",
                        conversation.id, peer_id
                    );
                    continue;
                };
                let last_message = db.last_message(&row.id)?.and_then(|m| m.to_message());
                let unread_count = db.unread_count(&row.id, &uid)?;
                summaries.push(ConversationSummary {
                    conversation,
                    peer,
                    last_message,
                    unread_count,
                });
            }
            Ok(summaries)
        })
        .await
        .unwrap_or_default()
    }
}
