use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use uuid::Uuid;

use crate::{
    error::AppError,
    services::sse_service::{self, StreamTarget},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/public",
    tag = "sse",
    responses((status = 200, description = "Default viewer SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream the default viewer's state, timer and notices.
pub async fn public_stream(
    State(state): State<SharedState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    Ok(sse_service::open_stream(&state, StreamTarget::Public)?)
}

#[utoipa::path(
    get,
    path = "/sse/admin",
    tag = "sse",
    responses((status = 200, description = "Control window SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream the control window's state, solution included.
pub async fn admin_stream(
    State(state): State<SharedState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    Ok(sse_service::open_stream(&state, StreamTarget::Admin)?)
}

#[utoipa::path(
    get,
    path = "/sse/viewers/{id}",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Viewer window")),
    responses(
        (status = 200, description = "Viewer SSE stream", content_type = "text/event-stream", body = String),
        (status = 404, description = "Unknown viewer")
    )
)]
/// Stream one viewer's state; ends when the viewer is closed.
pub async fn viewer_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    Ok(sse_service::open_stream(&state, StreamTarget::Viewer(id))?)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/public", get(public_stream))
        .route("/sse/admin", get(admin_stream))
        .route("/sse/viewers/{id}", get(viewer_stream))
}
