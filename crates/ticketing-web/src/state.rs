//! Shared application state handed to every handler via axum's `State`
//! extractor.

use std::sync::Arc;

use ticketing_engine::{ReadPathService, ReservationEngine};

/// The reaper is not reachable from any handler (§4.3: it runs on its own
/// cadence, not on request), so it is wired directly in `ticketing-server`
/// rather than carried here.
#[derive(Clone)]
pub struct AppState {
    pub reservations: Arc<ReservationEngine>,
    pub read_path: Arc<ReadPathService>,
}

impl AppState {
    pub fn new(reservations: Arc<ReservationEngine>, read_path: Arc<ReadPathService>) -> Self {
        Self {
            reservations,
            read_path,
        }
    }
}
