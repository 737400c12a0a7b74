//! Maps `TicketingError` onto the HTTP error body shape (§6, §7):
//! `{status, error, message, path, timestamp}`, one conversion site rather
//! than one per handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use ticketing_common::TicketingError;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

/// A `TicketingError` paired with the request path it occurred on, so the
/// error body can carry `path` without threading it through every call in
/// the engine.
pub struct ApiError {
    pub error: TicketingError,
    pub path: String,
}

impl ApiError {
    pub fn new(error: TicketingError, path: impl Into<String>) -> Self {
        Self {
            error,
            path: path.into(),
        }
    }
}

/// §7: each variant maps to exactly one status code. `LockUnavailable` is
/// retriable, so it maps to 503, not 409.
fn status_for(err: &TicketingError) -> StatusCode {
    match err {
        TicketingError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
        TicketingError::EventNotFound(_) => StatusCode::NOT_FOUND,
        TicketingError::NoTicketsAvailable(_) => StatusCode::CONFLICT,
        TicketingError::LockUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        TicketingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.error);

        if status.is_server_error() {
            error!(path = %self.path, error = %self.error, "internal error");
        }

        let body = ErrorBody {
            status: status.as_u16(),
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message: self.error.to_string(),
            path: self.path,
            timestamp: Utc::now(),
        };

        (status, Json(body)).into_response()
    }
}
