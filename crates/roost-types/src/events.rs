use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Message;

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server accepted the connection for this user.
    Ready { user_id: Uuid },

    /// A message was appended to a conversation the client subscribed to.
    MessageNew { message: Message },

    /// Reciprocal interest completed: both participants get this once,
    /// when the match row is first created.
    MatchCreated {
        match_id: Uuid,
        tenant_id: Uuid,
        landlord_id: Uuid,
        listing_id: Uuid,
    },
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// First frame after connecting. Session issuance lives outside this
    /// service; the gateway takes the asserted id as-is.
    Identify { user_id: Uuid },

    /// Replace the connection's conversation subscription set. Sending an
    /// empty list unsubscribes from everything.
    Subscribe { conversation_ids: Vec<Uuid> },
}
