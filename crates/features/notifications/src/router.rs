use crate::handlers;
use flock_kernel::server::ApiState;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Notification routes, meant to be nested under `/api/notifications`.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::list))
        .routes(routes!(handlers::unread_count))
        .routes(routes!(handlers::mark_all_read))
        .routes(routes!(handlers::bulk_action))
        .routes(routes!(handlers::clear_all))
        .routes(routes!(handlers::preferences, handlers::update_preferences))
        .routes(routes!(handlers::detail))
        .routes(routes!(handlers::mark_read))
}
