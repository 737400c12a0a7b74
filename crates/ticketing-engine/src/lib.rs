//! Reservation engine, expiry reaper, and read-path service: the business
//! logic that sits between the HTTP surface and the durable store/cache.

pub mod reaper;
pub mod read_path;
pub mod reservation;

pub use reaper::ExpiryReaper;
pub use read_path::ReadPathService;
pub use reservation::ReservationEngine;
