use crate::handlers::{comments, feed, posts};
use flock_kernel::server::ApiState;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Post routes, meant to be nested under `/api/posts`.
pub fn posts_router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(posts::list_posts, posts::create_post))
        .routes(routes!(posts::user_posts))
        .routes(routes!(posts::post_detail, posts::update_post, posts::delete_post))
        .routes(routes!(posts::like))
        .routes(routes!(posts::unlike))
        .routes(routes!(posts::add_comment))
        .routes(routes!(posts::post_comments))
}

/// Comment routes, meant to be nested under `/api/comments`.
pub fn comments_router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(comments::list_comments, comments::create_comment))
        .routes(routes!(comments::comment_detail, comments::update_comment, comments::delete_comment))
}

/// Feed and explore routes, meant to be nested under `/api`.
pub fn feed_router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(feed::feed))
        .routes(routes!(feed::user_feed))
        .routes(routes!(feed::explore))
}
