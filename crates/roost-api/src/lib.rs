//! HTTP surface over the coordination core. Handlers stay thin: parse
//! the request, call the core, shape the fail-soft response. Malformed
//! ids die in `Path<Uuid>` extraction with a 400 before any query runs.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use roost_core::{ConversationRegistry, MatchResolver, MessageLog};
use roost_gateway::dispatcher::Dispatcher;

pub mod conversations;
pub mod matches;
pub mod messages;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub registry: ConversationRegistry,
    pub messages: MessageLog,
    pub matches: MatchResolver,
    pub dispatcher: Dispatcher,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/conversations", post(conversations::open_conversation))
        .route(
            "/users/{user_id}/conversations",
            get(conversations::list_user_conversations),
        )
        .route(
            "/conversations/{conversation_id}/messages",
            get(messages::get_messages),
        )
        .route(
            "/conversations/{conversation_id}/messages",
            post(messages::send_message),
        )
        .route("/conversations/{conversation_id}/read", post(messages::mark_read))
        .route("/likes", post(matches::record_like))
        .route("/users/{user_id}/matches", get(matches::list_user_matches))
        .route("/matches/{match_id}", get(matches::get_match))
        .with_state(state)
}
