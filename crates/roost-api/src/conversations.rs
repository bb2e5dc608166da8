use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use roost_types::api::{OpenConversationRequest, OpenConversationResponse};

use crate::AppState;

/// Get-or-create the thread for a participant pair. The response id is
/// `null` when the pair is degenerate or the store did not answer; the
/// app treats that as "conversation not available right now".
pub async fn open_conversation(
    State(state): State<AppState>,
    Json(req): Json<OpenConversationRequest>,
) -> impl IntoResponse {
    let conversation_id = state.registry.get_or_create(req.user_a, req.user_b).await.ok();
    Json(OpenConversationResponse { conversation_id })
}

/// The user's conversation list, newest activity first, peers resolved.
pub async fn list_user_conversations(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    Json(state.registry.list_for_user(user_id).await)
}
