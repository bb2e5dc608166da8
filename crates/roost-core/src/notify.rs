use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use roost_db::Database;
use roost_types::models::Message;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

use crate::run_store;

/// In-process fan-out seam between the message log and the gateway.
/// Subscribers see messages published after they subscribed, in publish
/// order; there is no replay of history.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

struct NotifierInner {
    db: Arc<Database>,
    next_token: AtomicU64,
    /// conversation -> subscription token -> sender into that
    /// subscription's drain task.
    channels: RwLock<HashMap<Uuid, HashMap<u64, mpsc::UnboundedSender<Message>>>>,
}

impl Notifier {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            inner: Arc::new(NotifierInner {
                db,
                next_token: AtomicU64::new(1),
                channels: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Registers `on_message` for a conversation and hands back the
    /// handle that controls the subscription's lifetime. Subscribing to
    /// a conversation the store does not know (or cannot confirm) yields
    /// an inert handle: valid to hold and unsubscribe, delivers nothing.
    pub async fn subscribe<F>(&self, conversation_id: Uuid, on_message: F) -> Subscription
    where
        F: Fn(Message) + Send + 'static,
    {
        let db = self.inner.db.clone();
        let known = run_store("subscription availability check", move || {
            db.get_conversation(&conversation_id.to_string())
        })
        .await
        .ok()
        .flatten()
        .is_some();
        if !known {
            warn!(
                "Subscription to unknown conversation {} registered as inert",
                conversation_id
            );
            return Subscription { state: None };
        }

        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        {
            let mut channels = self
                .inner
                .channels
                .write()
                .expect("notifier lock poisoned");
            channels.entry(conversation_id).or_default().insert(token, tx);
        }

        let active = Arc::new(AtomicBool::new(true));
        let active_drain = active.clone();
        let drain = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                // Checked per delivery so a just-unsubscribed handle
                // cannot receive queued leftovers.
                if !active_drain.load(Ordering::Acquire) {
                    break;
                }
                on_message(message);
            }
        });

        Subscription {
            state: Some(SubscriptionState {
                notifier: self.inner.clone(),
                conversation_id,
                token,
                active,
                drain,
            }),
        }
    }

    /// Hands one committed message to every live subscription for its
    /// conversation. Callers invoke this after the store commit, never
    /// before.
    pub fn publish(&self, conversation_id: Uuid, message: &Message) {
        let senders: Vec<mpsc::UnboundedSender<Message>> = {
            let channels = self
                .inner
                .channels
                .read()
                .expect("notifier lock poisoned");
            match channels.get(&conversation_id) {
                Some(per_conversation) => per_conversation.values().cloned().collect(),
                None => return,
            }
        };
        for tx in senders {
            // A send to a torn-down subscription is a no-op.
            let _ = tx.send(message.clone());
        }
    }
}

struct SubscriptionState {
    notifier: Arc<NotifierInner>,
    conversation_id: Uuid,
    token: u64,
    active: Arc<AtomicBool>,
    drain: JoinHandle<()>,
}

/// Resource handle for one registered callback. Dropping it tears the
/// subscription down the same way an explicit `unsubscribe` does.
pub struct Subscription {
    state: Option<SubscriptionState>,
}

impl Subscription {
    /// False for inert handles and for handles already unsubscribed.
    pub fn is_active(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| s.active.load(Ordering::Acquire))
    }

    /// Stops delivery. Idempotent; once this returns, no new callback
    /// invocation begins.
    pub fn unsubscribe(&self) {
        let Some(state) = &self.state else {
            return;
        };
        if !state.active.swap(false, Ordering::AcqRel) {
            return;
        }
        {
            let mut channels = state
                .notifier
                .channels
                .write()
                .expect("notifier lock poisoned");
            if let Some(per_conversation) = channels.get_mut(&state.conversation_id) {
                per_conversation.remove(&state.token);
                if per_conversation.is_empty() {
                    channels.remove(&state.conversation_id);
                }
            }
        }
        state.drain.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
