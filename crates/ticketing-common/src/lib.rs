//! Shared types and utilities for the ticket reservation service.

pub mod config;
pub mod domain;
pub mod error;
pub mod health;
pub mod ids;

pub use config::{load_app_config, load_config, AppConfig, CacheConfig, DatabaseConfig, LockConfig, ReaperConfig, RedisConfig, ReservationConfig, ServerConfig};
pub use domain::{
    validate_customer_email, validate_event_id, Event, EventDraft, EventSortKey, Page, Ticket,
    TicketStatus,
};
pub use error::{TicketingError, TicketingResult};
pub use health::HealthResponse;
pub use ids::{EventId, TicketId};
