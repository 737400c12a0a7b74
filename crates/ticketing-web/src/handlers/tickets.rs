//! `/api/v1/tickets*` handlers (§6).

use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use ticketing_common::Ticket;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_available_tickets(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let path = uri.path().to_string();
    let event_id =
        ticketing_common::validate_event_id(event_id).map_err(|e| ApiError::new(e, path.clone()))?;

    // §6: 404 if the event itself does not exist.
    state
        .read_path
        .get_event(event_id)
        .await
        .map_err(|e| ApiError::new(e, path.clone()))?;

    state
        .read_path
        .list_available_tickets(event_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, path))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveQuery {
    pub event_id: i64,
    pub customer_email: String,
}

pub async fn reserve_ticket(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<ReserveQuery>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let path = uri.path().to_string();

    // The engine itself re-checks both constraints (§4.2 step pre-lock); the
    // handler passes the raw id through rather than duplicating the check.
    state
        .reservations
        .reserve(ticketing_common::EventId(query.event_id), &query.customer_email)
        .await
        .map(|ticket| (StatusCode::CREATED, Json(ticket)))
        .map_err(|e| ApiError::new(e, path))
}

pub async fn list_by_customer(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(email): Path<String>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    state
        .read_path
        .list_by_customer(&email)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, uri.path()))
}
