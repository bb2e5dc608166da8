use std::sync::Arc;

use roost_db::Database;
use roost_types::models::Message;
use thiserror::Error;
use uuid::Uuid;

use crate::notify::Notifier;
use crate::{Unavailable, run_store};

/// Why a send was refused. The HTTP layer maps these onto fail-soft
/// response bodies instead of 5xx statuses.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("message content is empty")]
    EmptyContent,
    #[error("sender and receiver are not this conversation's participants")]
    NotParticipant,
    #[error(transparent)]
    Unavailable(#[from] Unavailable),
}

/// Append-only message store for conversations. Messages are never
/// edited or deleted; the only mutation is the unread flag flipping to
/// read.
#[derive(Clone)]
pub struct MessageLog {
    db: Arc<Database>,
    notifier: Notifier,
}

impl MessageLog {
    pub fn new(db: Arc<Database>, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    /// The `limit` most recent messages, oldest first. Unavailable or
    /// unknown conversations read as empty; corrupt rows are skipped.
    pub async fn list(&self, conversation_id: Uuid, limit: u32) -> Vec<Message> {
        let db = self.db.clone();
        run_store("message list", move || {
            db.get_messages(&conversation_id.to_string(), limit)
        })
        .await
        .map(|rows| rows.iter().filter_map(|row| row.to_message()).collect())
        .unwrap_or_default()
    }

    /// Validates, stores, and publishes one message. The insert and the
    /// parent conversation's last-message refresh commit together; the
    /// notifier only sees the message after that commit.
    pub async fn send(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<Message, SendError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(SendError::EmptyContent);
        }

        let db = self.db.clone();
        let conversation = run_store("conversation lookup", move || {
            db.get_conversation(&conversation_id.to_string())
        })
        .await?
        .and_then(|row| row.to_conversation())
        .ok_or(Unavailable)?;

        if !conversation.has_pair(sender_id, receiver_id) {
            return Err(SendError::NotParticipant);
        }

        let db = self.db.clone();
        let text = content.to_string();
        let stored = run_store("message append", move || {
            db.append_message(
                &Uuid::new_v4().to_string(),
                &conversation_id.to_string(),
                &sender_id.to_string(),
                &receiver_id.to_string(),
                &text,
            )
        })
        .await?;

        let message = stored.to_message().ok_or(Unavailable)?;
        self.notifier.publish(conversation_id, &message);
        Ok(message)
    }

    /// Marks every message addressed to `reader_id` in the conversation
    /// as read and reports how many rows flipped. Repeat calls flip
    /// nothing and report 0.
    pub async fn mark_read(
        &self,
        conversation_id: Uuid,
        reader_id: Uuid,
    ) -> Result<usize, Unavailable> {
        let db = self.db.clone();
        run_store("mark messages read", move || {
            db.mark_messages_read(&conversation_id.to_string(), &reader_id.to_string())
        })
        .await
    }

    /// Unread-message count for one participant; 0 when the store does
    /// not answer.
    pub async fn unread_count(&self, conversation_id: Uuid, user_id: Uuid) -> i64 {
        let db = self.db.clone();
        run_store("unread count", move || {
            db.unread_count(&conversation_id.to_string(), &user_id.to_string())
        })
        .await
        .unwrap_or(0)
    }
}
