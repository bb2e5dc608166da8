use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use roost_core::{LikeOutcome, LikeTarget};
use roost_types::api::{LikeOutcomeKind, LikeRequest, LikeResponse};
use roost_types::events::GatewayEvent;

use crate::AppState;

/// Records a swipe. A request without `tenant_id` is a tenant liking
/// the listing; with it, a landlord liking that tenant for the listing.
/// When the swipe completes a new match, both participants get the
/// `MatchCreated` push that drives the "It's a match" screen.
pub async fn record_like(
    State(state): State<AppState>,
    Json(req): Json<LikeRequest>,
) -> impl IntoResponse {
    let target = match req.tenant_id {
        Some(tenant_id) => LikeTarget::Tenant { tenant_id, listing_id: req.listing_id },
        None => LikeTarget::Listing(req.listing_id),
    };

    let response = match state.matches.record_like(req.actor_id, target).await {
        LikeOutcome::Matched { record, newly_formed } => {
            if newly_formed {
                let event = GatewayEvent::MatchCreated {
                    match_id: record.id,
                    tenant_id: record.tenant_id,
                    landlord_id: record.landlord_id,
                    listing_id: record.listing_id,
                };
                state
                    .dispatcher
                    .send_to_user(record.tenant_id, event.clone())
                    .await;
                state.dispatcher.send_to_user(record.landlord_id, event).await;
            }
            LikeResponse {
                outcome: LikeOutcomeKind::Matched,
                match_id: Some(record.id),
            }
        }
        LikeOutcome::Recorded => LikeResponse { outcome: LikeOutcomeKind::Recorded, match_id: None },
        LikeOutcome::Rejected => LikeResponse { outcome: LikeOutcomeKind::Rejected, match_id: None },
        LikeOutcome::Unavailable => LikeResponse {
            outcome: LikeOutcomeKind::Unavailable,
            match_id: None,
        },
    };
    Json(response)
}

/// Every fully resolved match for the user, in the order they formed.
pub async fn list_user_matches(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    Json(state.matches.list_matches(user_id).await)
}

/// One match, fully resolved, or 404. A match whose references no
/// longer load reads as missing rather than partially rendered.
pub async fn get_match(State(state): State<AppState>, Path(match_id): Path<Uuid>) -> Response {
    match state.matches.match_details(match_id).await {
        Some(view) => Json(view).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
