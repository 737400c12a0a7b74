//! Durable store for events and tickets.
//!
//! This is the sole authoritative store (§5): only `EventRepository::create`
//! mutates event rows, and only the transactional paths in `TicketRepository`
//! mutate ticket rows. Every query here runs as runtime SQL (`sqlx::query`,
//! not `query!`) so the workspace builds without a live `DATABASE_URL`.

pub mod events;
pub mod pool;
pub mod tickets;

pub use events::{EventRepository, PgEventRepository};
pub use pool::connect_pool;
pub use tickets::{PgTicketRepository, TicketRepository};
