//! Builds the complete Axum router (§6).

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{events, health, tickets};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/paged", get(events::list_events_paged))
        .route("/events/available", get(events::list_available_events))
        .route("/events/:id", get(events::get_event))
        .route(
            "/tickets/event/:event_id",
            get(tickets::list_available_tickets),
        )
        .route("/tickets/reserve", post(tickets::reserve_ticket))
        .route(
            "/tickets/customer/:email",
            get(tickets::list_by_customer),
        );

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
