use crate::handlers;
use flock_kernel::server::ApiState;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Account routes, meant to be nested under `/api/auth`.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::register))
        .routes(routes!(handlers::login))
        .routes(routes!(handlers::logout))
        .routes(routes!(handlers::profile, handlers::update_profile))
        .routes(routes!(handlers::list_users))
        .routes(routes!(handlers::user_detail))
        .routes(routes!(handlers::follow))
        .routes(routes!(handlers::unfollow))
        .routes(routes!(handlers::follow_user))
        .routes(routes!(handlers::unfollow_user))
        .routes(routes!(handlers::followers))
        .routes(routes!(handlers::following))
}
