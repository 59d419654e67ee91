use crate::Accounts;
use crate::auth::CurrentUser;
use crate::models::{
    FollowResponse, LoginRequest, LoginResponse, MessageResponse, PageQuery,
    ProfileUpdateResponse, RegisterRequest, RegisterResponse, UpdateProfileRequest, UserDetail,
    UserListQuery, UserSummary,
};
use crate::repository::FollowDirection;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use flock_derive::api_handler;
use flock_domain::constants::{ACCOUNT, ACCOUNTS_TAG};
use flock_kernel::security::resource::ResourceGuard;
use flock_kernel::server::{ApiError, ApiJson, ApiQuery, ApiState, Page, PageRequest};

#[api_handler(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = CREATED, description = "Account created", body = RegisterResponse),
        (status = BAD_REQUEST, description = "Invalid or duplicate registration data"),
    ),
    tag = ACCOUNTS_TAG,
)]
pub(crate) async fn register(
    State(state): State<ApiState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let accounts = state.slice::<Accounts>()?;
    let (user, token) = accounts.service.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { message: "User registered successfully".to_owned(), user, token }),
    ))
}

#[api_handler(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = OK, description = "Token issued", body = LoginResponse),
        (status = BAD_REQUEST, description = "Missing or wrong credentials"),
    ),
    tag = ACCOUNTS_TAG,
)]
pub(crate) async fn login(
    State(state): State<ApiState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let accounts = state.slice::<Accounts>()?;
    let (user, token) = accounts.service.login(request).await?;

    Ok(Json(LoginResponse { message: "Login successful".to_owned(), token, user }))
}

#[api_handler(
    post,
    path = "/logout",
    responses(
        (status = OK, description = "Token deleted", body = MessageResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid token"),
    ),
    security(("token" = [])),
    tag = ACCOUNTS_TAG,
)]
pub(crate) async fn logout(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let accounts = state.slice::<Accounts>()?;
    accounts.service.logout(&user.id).await?;

    Ok(Json(MessageResponse::new("Logout successful")))
}

#[api_handler(
    get,
    path = "/profile",
    responses((status = OK, description = "The caller's profile", body = UserDetail)),
    security(("token" = [])),
    tag = ACCOUNTS_TAG,
)]
pub(crate) async fn profile(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UserDetail>, ApiError> {
    let accounts = state.slice::<Accounts>()?;
    Ok(Json(accounts.service.profile(&user.id).await?))
}

#[api_handler(
    method(put, patch),
    path = "/profile",
    request_body = UpdateProfileRequest,
    responses((status = OK, description = "Profile updated", body = ProfileUpdateResponse)),
    security(("token" = [])),
    tag = ACCOUNTS_TAG,
)]
pub(crate) async fn update_profile(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    ApiJson(changes): ApiJson<UpdateProfileRequest>,
) -> Result<Json<ProfileUpdateResponse>, ApiError> {
    let accounts = state.slice::<Accounts>()?;
    let user = accounts.service.update_profile(&user.id, changes).await?;

    Ok(Json(ProfileUpdateResponse { message: "Profile updated successfully".to_owned(), user }))
}

#[api_handler(
    get,
    path = "/users",
    params(UserListQuery),
    responses((status = OK, description = "User directory, newest first", body = Page<UserDetail>)),
    security(("token" = [])),
    tag = ACCOUNTS_TAG,
)]
pub(crate) async fn list_users(
    State(state): State<ApiState>,
    _: CurrentUser,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<Json<Page<UserDetail>>, ApiError> {
    let accounts = state.slice::<Accounts>()?;
    let feed = &state.config.feed;
    let page = PageRequest::new(query.page, query.page_size, feed.default_page_size, feed.max_page_size);

    Ok(Json(accounts.service.list(query.search.as_deref(), page).await?))
}

#[api_handler(
    get,
    path = "/users/{id}",
    params(("id" = String, Path, description = "Account id")),
    responses(
        (status = OK, description = "Account profile", body = UserDetail),
        (status = NOT_FOUND, description = "No such account"),
    ),
    security(("token" = [])),
    tag = ACCOUNTS_TAG,
)]
pub(crate) async fn user_detail(
    State(state): State<ApiState>,
    _: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<UserDetail>, ApiError> {
    let id = ResourceGuard::verify(id, ACCOUNT)?;
    let accounts = state.slice::<Accounts>()?;

    Ok(Json(accounts.service.profile(&id).await?))
}

#[api_handler(
    post,
    path = "/follow/{id}",
    params(("id" = String, Path, description = "Account to follow")),
    responses(
        (status = OK, description = "Now following", body = FollowResponse),
        (status = BAD_REQUEST, description = "Self-follow or already following"),
        (status = NOT_FOUND, description = "No such account"),
    ),
    security(("token" = [])),
    tag = ACCOUNTS_TAG,
)]
pub(crate) async fn follow(
    state: State<ApiState>,
    user: CurrentUser,
    id: Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    follow_account(state, user, id).await
}

#[api_handler(
    post,
    path = "/users/{id}/follow",
    params(("id" = String, Path, description = "Account to follow")),
    responses((status = OK, description = "Now following", body = FollowResponse)),
    security(("token" = [])),
    tag = ACCOUNTS_TAG,
)]
pub(crate) async fn follow_user(
    state: State<ApiState>,
    user: CurrentUser,
    id: Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    follow_account(state, user, id).await
}

#[api_handler(
    post,
    path = "/unfollow/{id}",
    params(("id" = String, Path, description = "Account to unfollow")),
    responses(
        (status = OK, description = "Unfollowed", body = FollowResponse),
        (status = BAD_REQUEST, description = "Self-unfollow or not following"),
        (status = NOT_FOUND, description = "No such account"),
    ),
    security(("token" = [])),
    tag = ACCOUNTS_TAG,
)]
pub(crate) async fn unfollow(
    state: State<ApiState>,
    user: CurrentUser,
    id: Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    unfollow_account(state, user, id).await
}

#[api_handler(
    post,
    path = "/users/{id}/unfollow",
    params(("id" = String, Path, description = "Account to unfollow")),
    responses((status = OK, description = "Unfollowed", body = FollowResponse)),
    security(("token" = [])),
    tag = ACCOUNTS_TAG,
)]
pub(crate) async fn unfollow_user(
    state: State<ApiState>,
    user: CurrentUser,
    id: Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    unfollow_account(state, user, id).await
}

#[api_handler(
    get,
    path = "/users/{id}/followers",
    params(("id" = String, Path, description = "Account id"), PageQuery),
    responses((status = OK, description = "Followers, most recent first", body = Page<UserSummary>)),
    security(("token" = [])),
    tag = ACCOUNTS_TAG,
)]
pub(crate) async fn followers(
    state: State<ApiState>,
    _: CurrentUser,
    id: Path<String>,
    query: ApiQuery<PageQuery>,
) -> Result<Json<Page<UserSummary>>, ApiError> {
    connections(state, id, query, FollowDirection::Followers).await
}

#[api_handler(
    get,
    path = "/users/{id}/following",
    params(("id" = String, Path, description = "Account id"), PageQuery),
    responses((status = OK, description = "Followed accounts, most recent first", body = Page<UserSummary>)),
    security(("token" = [])),
    tag = ACCOUNTS_TAG,
)]
pub(crate) async fn following(
    state: State<ApiState>,
    _: CurrentUser,
    id: Path<String>,
    query: ApiQuery<PageQuery>,
) -> Result<Json<Page<UserSummary>>, ApiError> {
    connections(state, id, query, FollowDirection::Following).await
}

async fn follow_account(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    let id = ResourceGuard::verify(id, ACCOUNT)?;
    let accounts = state.slice::<Accounts>()?;
    let (username, following_count) = accounts.service.follow(&user.id, &id).await?;

    Ok(Json(FollowResponse {
        message: format!("You are now following {username}."),
        following_count,
    }))
}

async fn unfollow_account(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    let id = ResourceGuard::verify(id, ACCOUNT)?;
    let accounts = state.slice::<Accounts>()?;
    let (username, following_count) = accounts.service.unfollow(&user.id, &id).await?;

    Ok(Json(FollowResponse { message: format!("You have unfollowed {username}."), following_count }))
}

async fn connections(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
    direction: FollowDirection,
) -> Result<Json<Page<UserSummary>>, ApiError> {
    let id = ResourceGuard::verify(id, ACCOUNT)?;
    let accounts = state.slice::<Accounts>()?;
    let feed = &state.config.feed;
    let page = PageRequest::new(query.page, query.page_size, feed.default_page_size, feed.max_page_size);

    Ok(Json(accounts.service.connections(&id, direction, page).await?))
}
