/// Moderator service driving the round controller.
pub mod admin_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Single writer turning moderator intents into published transitions.
pub mod round_controller;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Per-window Server-Sent Events streams.
pub mod sse_service;
/// State slot health supervision and degraded mode.
pub mod storage_supervisor;
/// Elapsed round time as shown by each window.
pub mod timer;
/// Read-only projections for audience windows.
pub mod viewer_service;
