use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use roost_core::SendError;
use roost_types::api::{MarkReadRequest, MarkReadResponse, SendMessageRequest, SendRejected};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

/// The most recent messages of a conversation, oldest first. An unknown
/// or unavailable conversation reads as an empty list.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    let limit = query.limit.min(200);
    Json(state.messages.list(conversation_id, limit).await)
}

/// 201 with the stored message on success; 200 with `sent: false` and a
/// reason tag on any rejection. The app renders the reason, never an
/// error screen.
pub async fn send_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    match state
        .messages
        .send(conversation_id, req.sender_id, req.receiver_id, &req.content)
        .await
    {
        Ok(message) => (StatusCode::CREATED, Json(message)).into_response(),
        Err(err) => {
            let reason = match err {
                SendError::EmptyContent => "empty_content",
                SendError::NotParticipant => "not_participant",
                SendError::Unavailable(_) => "unavailable",
            };
            let body = SendRejected { sent: false, reason: reason.to_string() };
            (StatusCode::OK, Json(body)).into_response()
        }
    }
}

/// Marks everything addressed to the reader in this conversation as
/// read. `ok: false` with zero updates is the unavailable shape.
pub async fn mark_read(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Json(req): Json<MarkReadRequest>,
) -> impl IntoResponse {
    match state.messages.mark_read(conversation_id, req.reader_id).await {
        Ok(updated) => Json(MarkReadResponse { ok: true, updated }),
        Err(_) => Json(MarkReadResponse { ok: false, updated: 0 }),
    }
}
