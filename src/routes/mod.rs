use axum::Router;

use crate::state::SharedState;

/// Swagger UI and the OpenAPI document.
pub mod docs;
/// Liveness and storage health.
pub mod health;
/// Tournament CRUD and match reporting.
pub mod tournament;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(tournament::router())
        .merge(docs::router())
        .with_state(state)
}
