use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use roost_types::events::GatewayEvent;

/// Tracks connected users and routes targeted events to them. Message
/// fan-out per conversation is the notifier's job; this only carries
/// user-addressed pushes such as `MatchCreated`.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Per-user send channels: user_id -> (conn_id, sender). One channel
    /// per user; a reconnect replaces the previous registration.
    user_channels: RwLock<HashMap<Uuid, (Uuid, mpsc::UnboundedSender<GatewayEvent>)>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                user_channels: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Registers a connection's event sender for a user and returns the
    /// connection id that guards later unregistration.
    pub async fn register_user_channel(
        &self,
        user_id: Uuid,
        sender: mpsc::UnboundedSender<GatewayEvent>,
    ) -> Uuid {
        let conn_id = Uuid::new_v4();
        self.inner
            .user_channels
            .write()
            .await
            .insert(user_id, (conn_id, sender));
        conn_id
    }

    /// Unregisters a user channel, but only if `conn_id` still owns it.
    /// A reconnect that already replaced the registration is left alone.
    pub async fn unregister_user_channel(&self, user_id: Uuid, conn_id: Uuid) {
        let mut channels = self.inner.user_channels.write().await;
        if let Some((stored_conn_id, _)) = channels.get(&user_id) {
            if *stored_conn_id == conn_id {
                channels.remove(&user_id);
            }
        }
    }

    /// Sends a targeted event to a user. No-op when they are offline.
    pub async fn send_to_user(&self, user_id: Uuid, event: GatewayEvent) {
        let channels = self.inner.user_channels.read().await;
        if let Some((_, tx)) = channels.get(&user_id) {
            let _ = tx.send(event);
        }
    }
}
