//! Operational health check. Not scoped out by the Non-goals (those name
//! payment, auth, multi-seat reservations, cross-event atomicity, not
//! operational endpoints).

use axum::Json;
use ticketing_common::HealthResponse;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
