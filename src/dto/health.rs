use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Failure reported by the storage backend on the last probe, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_error: Option<String>,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            storage_error: None,
        }
    }

    /// Create a health response indicating the system is in degraded mode.
    pub fn degraded(storage_error: Option<String>) -> Self {
        Self {
            status: "degraded".to_string(),
            storage_error,
        }
    }
}
