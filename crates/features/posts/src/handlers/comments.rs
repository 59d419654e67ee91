use crate::Posts;
use crate::error::PostsError;
use crate::handlers::post_filter;
use crate::models::{CommentListQuery, CommentView, CreateCommentRequest, UpdateCommentRequest};
use crate::service::CommentQuery;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use flock_accounts::CurrentUser;
use flock_derive::api_handler;
use flock_domain::constants::{COMMENT, COMMENTS_TAG, POST};
use flock_kernel::security::resource::ResourceGuard;
use flock_kernel::server::{ApiError, ApiJson, ApiQuery, ApiState, Page};

#[api_handler(
    get,
    path = "/",
    params(CommentListQuery),
    responses((status = OK, description = "Comments matching the filters, newest first", body = Page<CommentView>)),
    security(("token" = [])),
    tag = COMMENTS_TAG,
)]
pub(crate) async fn list_comments(
    State(state): State<ApiState>,
    _: CurrentUser,
    ApiQuery(query): ApiQuery<CommentListQuery>,
) -> Result<Json<Page<CommentView>>, ApiError> {
    let posts = state.slice::<Posts>()?;
    let page = posts.service.page(query.page, query.page_size);
    let filter =
        CommentQuery { post: post_filter(query.post), author: query.author, search: query.search };

    Ok(Json(posts.service.list_comments(filter, page).await?))
}

#[api_handler(
    post,
    path = "/",
    request_body = CreateCommentRequest,
    responses(
        (status = CREATED, description = "Comment added", body = CommentView),
        (status = BAD_REQUEST, description = "Unknown post, blank content or invalid parent"),
    ),
    security(("token" = [])),
    tag = COMMENTS_TAG,
)]
pub(crate) async fn create_comment(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let unknown_post = || ApiError::validation("Post not found.");
    let post = ResourceGuard::verify(&request.post, POST).map_err(|_| unknown_post())?;
    let posts = state.slice::<Posts>()?;

    let comment = match posts.service.add_comment(&post, &user, request.content, request.parent).await
    {
        Ok(comment) => comment,
        Err(PostsError::NotFound { .. }) => return Err(unknown_post()),
        Err(e) => return Err(e.into()),
    };

    Ok((StatusCode::CREATED, Json(comment)))
}

#[api_handler(
    get,
    path = "/{id}",
    params(("id" = String, Path, description = "Comment id")),
    responses(
        (status = OK, description = "The comment", body = CommentView),
        (status = NOT_FOUND, description = "No such comment"),
    ),
    security(("token" = [])),
    tag = COMMENTS_TAG,
)]
pub(crate) async fn comment_detail(
    State(state): State<ApiState>,
    _: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<CommentView>, ApiError> {
    let id = ResourceGuard::verify(id, COMMENT)?;
    let posts = state.slice::<Posts>()?;

    Ok(Json(posts.service.comment(&id).await?))
}

#[api_handler(
    method(put, patch),
    path = "/{id}",
    params(("id" = String, Path, description = "Comment id")),
    request_body = UpdateCommentRequest,
    responses(
        (status = OK, description = "Comment updated", body = CommentView),
        (status = FORBIDDEN, description = "Not the author"),
        (status = NOT_FOUND, description = "No such comment"),
    ),
    security(("token" = [])),
    tag = COMMENTS_TAG,
)]
pub(crate) async fn update_comment(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(changes): ApiJson<UpdateCommentRequest>,
) -> Result<Json<CommentView>, ApiError> {
    let id = ResourceGuard::verify(id, COMMENT)?;
    let posts = state.slice::<Posts>()?;

    Ok(Json(posts.service.update_comment(&id, &user.id, changes.content).await?))
}

#[api_handler(
    delete,
    path = "/{id}",
    params(("id" = String, Path, description = "Comment id")),
    responses(
        (status = NO_CONTENT, description = "Comment and its replies deleted"),
        (status = FORBIDDEN, description = "Not the author"),
        (status = NOT_FOUND, description = "No such comment"),
    ),
    security(("token" = [])),
    tag = COMMENTS_TAG,
)]
pub(crate) async fn delete_comment(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = ResourceGuard::verify(id, COMMENT)?;
    let posts = state.slice::<Posts>()?;
    posts.service.delete_comment(&id, &user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}
