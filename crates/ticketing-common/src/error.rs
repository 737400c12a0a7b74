//! Error taxonomy for the ticket reservation service.

use thiserror::Error;

/// Result type alias for ticketing operations.
pub type TicketingResult<T> = Result<T, TicketingError>;

/// Unified error type for the reservation pipeline and its surfaces.
///
/// Each variant is mapped to exactly one HTTP status at the web surface;
/// see `ticketing-web::error` for the mapping.
#[derive(Error, Debug)]
pub enum TicketingError {
    /// Raised before any side effect; carries every violated constraint.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// A referenced event id has no row in the durable store.
    #[error("Event {0} not found")]
    EventNotFound(i64),

    /// The event's inventory is exhausted at claim time.
    #[error("No tickets available for event {0}")]
    NoTicketsAvailable(i64),

    /// The reservation lock could not be acquired within the wait budget.
    #[error("lock unavailable for key {0}")]
    LockUnavailable(String),

    /// Any unexpected condition; the message is generic on purpose, details
    /// are logged server-side rather than returned to the caller.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for TicketingError {
    fn from(err: sqlx::Error) -> Self {
        TicketingError::Internal(format!("database error: {err}"))
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for TicketingError {
    fn from(err: redis::RedisError) -> Self {
        TicketingError::Internal(format!("cache error: {err}"))
    }
}

impl From<validator::ValidationErrors> for TicketingError {
    fn from(err: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| format!("{field}: {m}"))
                        .unwrap_or_else(|| format!("{field}: {}", e.code))
                })
            })
            .collect();
        TicketingError::ValidationFailed(messages.join("; "))
    }
}
