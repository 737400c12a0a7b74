//! Thin HTTP surface for the ticket reservation service (§4.5, §6).
//!
//! Parses requests, enforces input constraints, and maps domain errors to
//! status codes. Not part of the core (§1): it owns no state and contains
//! no business logic of its own.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
