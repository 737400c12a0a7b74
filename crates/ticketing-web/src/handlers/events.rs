//! `/api/v1/events*` handlers (§6).

use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use ticketing_common::{Event, EventDraft, EventSortKey, Page};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_events(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Vec<Event>>, ApiError> {
    state
        .read_path
        .list_events()
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, uri.path()))
}

#[derive(Debug, Deserialize)]
pub struct PagedQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
    #[serde(default)]
    pub sort: String,
}

fn default_page() -> u32 {
    1
}
fn default_size() -> u32 {
    20
}

pub async fn list_events_paged(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PagedQuery>,
) -> Result<Json<Page<Event>>, ApiError> {
    let path = uri.path().to_string();

    let sort = if query.sort.is_empty() {
        EventSortKey::default()
    } else {
        query
            .sort
            .parse::<EventSortKey>()
            .map_err(|e| ApiError::new(e, path.clone()))?
    };

    if query.page == 0 || query.size == 0 || query.size > 200 {
        return Err(ApiError::new(
            ticketing_common::TicketingError::ValidationFailed(
                "page must be >= 1 and size must be between 1 and 200".to_string(),
            ),
            path,
        ));
    }

    state
        .read_path
        .list_events_paged(query.page, query.size, sort)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, path))
}

pub async fn get_event(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<i64>,
) -> Result<Json<Event>, ApiError> {
    let path = uri.path().to_string();
    let event_id = ticketing_common::validate_event_id(id).map_err(|e| ApiError::new(e, path.clone()))?;
    state
        .read_path
        .get_event(event_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, path))
}

pub async fn list_available_events(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Vec<Event>>, ApiError> {
    state
        .read_path
        .list_available_events()
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, uri.path()))
}

pub async fn create_event(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Json(draft): Json<EventDraft>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    state
        .read_path
        .create_event(draft)
        .await
        .map(|event| (StatusCode::CREATED, Json(event)))
        .map_err(|e| ApiError::new(e, uri.path()))
}
