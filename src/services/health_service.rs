use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the storage backend and report whether the service is degraded.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let storage_error = match state.require_tournament_store().await {
        Ok(store) => match store.health_check().await {
            Ok(()) => None,
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                Some(err.to_string())
            }
        },
        Err(err) => {
            warn!("storage unavailable (degraded mode)");
            Some(err.to_string())
        }
    };

    if state.is_degraded().await || storage_error.is_some() {
        HealthResponse::degraded(storage_error)
    } else {
        HealthResponse::ok()
    }
}
