use axum::Router;

use crate::state::SharedState;

/// Moderator controls and viewer window management.
pub mod admin;
/// Swagger UI and the OpenAPI document.
pub mod docs;
/// Liveness and slot health.
pub mod health;
/// Read-only audience displays.
pub mod public;
/// Server-Sent Events streams.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(admin::router())
        .merge(public::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
