use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Conversations --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenConversationRequest {
    pub user_a: Uuid,
    pub user_b: Uuid,
}

/// `conversation_id: null` is the unavailable sentinel: the thread could
/// not be resolved against real storage and the app should show its empty
/// state instead of an error.
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenConversationResponse {
    pub conversation_id: Option<Uuid>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendRejected {
    pub sent: bool,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkReadRequest {
    pub reader_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub ok: bool,
    pub updated: usize,
}

// -- Likes / matches --

/// A swipe. Without `tenant_id` this is a tenant-side like on the
/// listing; with it, a landlord-side like on that tenant for the listing.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LikeRequest {
    pub actor_id: Uuid,
    pub listing_id: Uuid,
    pub tenant_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeOutcomeKind {
    Matched,
    Recorded,
    Rejected,
    Unavailable,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub outcome: LikeOutcomeKind,
    pub match_id: Option<Uuid>,
}
