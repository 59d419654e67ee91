use crate::Posts;
use crate::models::{ExploreResponse, FeedQuery, FeedResponse, UserPostsResponse};
use axum::Json;
use axum::extract::{Path, State};
use flock_accounts::{CurrentUser, MaybeUser};
use flock_derive::api_handler;
use flock_domain::constants::FEED_TAG;
use flock_kernel::server::{ApiError, ApiQuery, ApiState};

#[api_handler(
    get,
    path = "/feed",
    params(FeedQuery),
    responses(
        (status = OK, description = "Posts of followed accounts, newest first", body = FeedResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid token"),
    ),
    security(("token" = [])),
    tag = FEED_TAG,
)]
pub(crate) async fn feed(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<FeedQuery>,
) -> Result<Json<FeedResponse>, ApiError> {
    let posts = state.slice::<Posts>()?;
    let page = posts.service.page(query.page, query.page_size);
    let (page, following_count) = posts.service.feed(&user.id, page).await?;

    Ok(Json(FeedResponse {
        count: page.count,
        following_count,
        page: page.page,
        page_size: page.page_size,
        posts: page.results,
    }))
}

#[api_handler(
    get,
    path = "/feed/{username}",
    params(("username" = String, Path, description = "Author username")),
    responses(
        (status = OK, description = "Every post of the user, newest first", body = UserPostsResponse),
        (status = NOT_FOUND, description = "Unknown user or no posts"),
    ),
    tag = FEED_TAG,
)]
pub(crate) async fn user_feed(
    State(state): State<ApiState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
) -> Result<Json<UserPostsResponse>, ApiError> {
    let posts = state.slice::<Posts>()?;

    match posts.service.posts_by_username(&username, viewer.id()).await? {
        Some(found) if !found.is_empty() => {
            Ok(Json(UserPostsResponse { count: found.len() as u64, username, posts: found }))
        },
        _ => Err(ApiError::not_found(format!("User {username} not found or has no posts."))),
    }
}

#[api_handler(
    get,
    path = "/explore",
    responses((status = OK, description = "The most recent posts from everyone", body = ExploreResponse)),
    tag = FEED_TAG,
)]
pub(crate) async fn explore(
    State(state): State<ApiState>,
    viewer: MaybeUser,
) -> Result<Json<ExploreResponse>, ApiError> {
    let posts = state.slice::<Posts>()?;
    let found = posts.service.explore(viewer.id()).await?;

    Ok(Json(ExploreResponse { count: found.len() as u64, posts: found }))
}
