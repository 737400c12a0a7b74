//! Health check response shape.

use serde::Serialize;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service health status.
    pub status: String,
    /// Crate version from Cargo.toml.
    pub version: String,
}

impl HealthResponse {
    /// Create a healthy response with the current crate version.
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self::healthy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_response_has_status() {
        let resp = HealthResponse::healthy();
        assert_eq!(resp.status, "healthy");
    }
}
