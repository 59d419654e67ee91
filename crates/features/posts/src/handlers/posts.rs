use crate::Posts;
use crate::models::{
    AddCommentRequest, CommentView, CreatePostRequest, LikeResponse, PostCommentsResponse,
    PostDetail, PostListQuery, PostView, UpdatePostRequest, UserPostsQuery, UserPostsResponse,
};
use crate::service::PostQuery;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use flock_accounts::CurrentUser;
use flock_derive::api_handler;
use flock_domain::constants::{POST, POSTS_TAG};
use flock_kernel::security::resource::ResourceGuard;
use flock_kernel::server::{ApiError, ApiJson, ApiQuery, ApiState, Page};

#[api_handler(
    get,
    path = "/",
    params(PostListQuery),
    responses((status = OK, description = "Posts matching the filters", body = Page<PostView>)),
    security(("token" = [])),
    tag = POSTS_TAG,
)]
pub(crate) async fn list_posts(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<PostListQuery>,
) -> Result<Json<Page<PostView>>, ApiError> {
    let posts = state.slice::<Posts>()?;
    let page = posts.service.page(query.page, query.page_size);
    let filter = PostQuery {
        author: query.author,
        search: query.search,
        ordering: query.ordering.unwrap_or_default(),
    };

    Ok(Json(posts.service.list_posts(filter, page, Some(&user.id)).await?))
}

#[api_handler(
    post,
    path = "/",
    request_body = CreatePostRequest,
    responses(
        (status = CREATED, description = "Post published", body = PostView),
        (status = BAD_REQUEST, description = "Blank or oversized fields"),
    ),
    security(("token" = [])),
    tag = POSTS_TAG,
)]
pub(crate) async fn create_post(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state.slice::<Posts>()?;
    let post = posts.service.create_post(&user, request).await?;

    Ok((StatusCode::CREATED, Json(post)))
}

#[api_handler(
    get,
    path = "/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = OK, description = "Post with its comment threads", body = PostDetail),
        (status = NOT_FOUND, description = "No such post"),
    ),
    security(("token" = [])),
    tag = POSTS_TAG,
)]
pub(crate) async fn post_detail(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<PostDetail>, ApiError> {
    let id = ResourceGuard::verify(id, POST)?;
    let posts = state.slice::<Posts>()?;

    Ok(Json(posts.service.post_detail(&id, Some(&user.id)).await?))
}

#[api_handler(
    method(put, patch),
    path = "/{id}",
    params(("id" = String, Path, description = "Post id")),
    request_body = UpdatePostRequest,
    responses(
        (status = OK, description = "Post updated", body = PostView),
        (status = FORBIDDEN, description = "Not the author"),
        (status = NOT_FOUND, description = "No such post"),
    ),
    security(("token" = [])),
    tag = POSTS_TAG,
)]
pub(crate) async fn update_post(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(changes): ApiJson<UpdatePostRequest>,
) -> Result<Json<PostView>, ApiError> {
    let id = ResourceGuard::verify(id, POST)?;
    let posts = state.slice::<Posts>()?;

    Ok(Json(posts.service.update_post(&id, &user.id, changes).await?))
}

#[api_handler(
    delete,
    path = "/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = NO_CONTENT, description = "Post, likes and comments deleted"),
        (status = FORBIDDEN, description = "Not the author"),
        (status = NOT_FOUND, description = "No such post"),
    ),
    security(("token" = [])),
    tag = POSTS_TAG,
)]
pub(crate) async fn delete_post(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = ResourceGuard::verify(id, POST)?;
    let posts = state.slice::<Posts>()?;
    posts.service.delete_post(&id, &user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[api_handler(
    post,
    path = "/{id}/like",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = CREATED, description = "Post liked", body = LikeResponse),
        (status = BAD_REQUEST, description = "Already liked"),
        (status = NOT_FOUND, description = "No such post"),
    ),
    security(("token" = [])),
    tag = POSTS_TAG,
)]
pub(crate) async fn like(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = ResourceGuard::verify(id, POST)?;
    let posts = state.slice::<Posts>()?;
    let likes_count = posts.service.like(&id, &user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(LikeResponse { message: "Post liked successfully".to_owned(), likes_count }),
    ))
}

#[api_handler(
    post,
    path = "/{id}/unlike",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = OK, description = "Like removed", body = LikeResponse),
        (status = BAD_REQUEST, description = "Not liked"),
        (status = NOT_FOUND, description = "No such post"),
    ),
    security(("token" = [])),
    tag = POSTS_TAG,
)]
pub(crate) async fn unlike(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>, ApiError> {
    let id = ResourceGuard::verify(id, POST)?;
    let posts = state.slice::<Posts>()?;
    let likes_count = posts.service.unlike(&id, &user.id).await?;

    Ok(Json(LikeResponse { message: "Post unliked successfully".to_owned(), likes_count }))
}

#[api_handler(
    post,
    path = "/{id}/comment",
    params(("id" = String, Path, description = "Post id")),
    request_body = AddCommentRequest,
    responses(
        (status = CREATED, description = "Comment added", body = CommentView),
        (status = BAD_REQUEST, description = "Blank content or invalid parent"),
        (status = NOT_FOUND, description = "No such post"),
    ),
    security(("token" = [])),
    tag = POSTS_TAG,
)]
pub(crate) async fn add_comment(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<AddCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = ResourceGuard::verify(id, POST)?;
    let posts = state.slice::<Posts>()?;
    let comment = posts.service.add_comment(&id, &user, request.content, request.parent).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

#[api_handler(
    get,
    path = "/{id}/comments",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = OK, description = "Comments of the post, newest first", body = PostCommentsResponse),
        (status = NOT_FOUND, description = "No such post"),
    ),
    security(("token" = [])),
    tag = POSTS_TAG,
)]
pub(crate) async fn post_comments(
    State(state): State<ApiState>,
    _: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<PostCommentsResponse>, ApiError> {
    let id = ResourceGuard::verify(id, POST)?;
    let posts = state.slice::<Posts>()?;
    let comments = posts.service.post_comments(&id).await?;

    Ok(Json(PostCommentsResponse { count: comments.len() as u64, comments }))
}

#[api_handler(
    get,
    path = "/user_posts",
    params(UserPostsQuery),
    responses(
        (status = OK, description = "Every post of the user, newest first", body = UserPostsResponse),
        (status = BAD_REQUEST, description = "Missing username"),
    ),
    security(("token" = [])),
    tag = POSTS_TAG,
)]
pub(crate) async fn user_posts(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<UserPostsQuery>,
) -> Result<Json<UserPostsResponse>, ApiError> {
    let Some(username) = query.username.filter(|u| !u.trim().is_empty()) else {
        return Err(ApiError::validation("username query parameter is required."));
    };
    let posts = state.slice::<Posts>()?;
    let found = posts.service.posts_by_username(&username, Some(&user.id)).await?.unwrap_or_default();

    Ok(Json(UserPostsResponse { count: found.len() as u64, username, posts: found }))
}
