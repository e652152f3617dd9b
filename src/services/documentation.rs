use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the quiz backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::sse::admin_stream,
        crate::routes::sse::viewer_stream,
        crate::routes::admin::get_state,
        crate::routes::admin::set_teams,
        crate::routes::admin::select_category,
        crate::routes::admin::select_pattern_count,
        crate::routes::admin::show_example,
        crate::routes::admin::clear_example,
        crate::routes::admin::reveal,
        crate::routes::admin::award,
        crate::routes::admin::skip,
        crate::routes::admin::toggle_pause,
        crate::routes::admin::reset,
        crate::routes::admin::list_viewers,
        crate::routes::admin::open_viewer,
        crate::routes::admin::close_viewer,
        crate::routes::public::public_state,
        crate::routes::public::scoreboard,
        crate::routes::public::timer,
        crate::routes::public::history,
        crate::routes::public::catalog,
        crate::routes::public::viewer_state,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::Notice,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "admin", description = "Moderator controls"),
        (name = "public", description = "Audience displays"),
        (name = "viewers", description = "Viewer window management"),
    )
)]
pub struct ApiDoc;
