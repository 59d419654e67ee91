use crate::Notifications;
use crate::models::{
    BulkActionRequest, CountResponse, MarkReadResponse, NotificationDetail, NotificationListItem,
    NotificationListQuery, PreferenceView, PreferencesUpdateResponse, UnreadCountResponse,
    UpdatePreferencesRequest,
};
use axum::Json;
use axum::extract::{Path, State};
use flock_accounts::CurrentUser;
use flock_derive::api_handler;
use flock_domain::constants::{NOTIFICATION, NOTIFICATIONS_TAG};
use flock_kernel::security::resource::ResourceGuard;
use flock_kernel::server::{ApiError, ApiJson, ApiQuery, ApiState, Page};

#[api_handler(
    get,
    path = "/",
    params(NotificationListQuery),
    responses((status = OK, description = "The caller's notifications, newest first", body = Page<NotificationListItem>)),
    security(("token" = [])),
    tag = NOTIFICATIONS_TAG,
)]
pub(crate) async fn list(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<NotificationListQuery>,
) -> Result<Json<Page<NotificationListItem>>, ApiError> {
    let notifications = state.slice::<Notifications>()?;
    let service = &notifications.service;
    let page = service.page(query.page, query.page_size);

    Ok(Json(service.list(&user.id, query.unread, query.verb, page).await?))
}

#[api_handler(
    get,
    path = "/{id}",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = OK, description = "Notification with a preview of its target", body = NotificationDetail),
        (status = NOT_FOUND, description = "Unknown or someone else's notification"),
    ),
    security(("token" = [])),
    tag = NOTIFICATIONS_TAG,
)]
pub(crate) async fn detail(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<NotificationDetail>, ApiError> {
    let id = ResourceGuard::verify(id, NOTIFICATION)?;
    let notifications = state.slice::<Notifications>()?;

    Ok(Json(notifications.service.detail(&user.id, &id).await?))
}

#[api_handler(
    post,
    path = "/{id}/mark_read",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = OK, description = "Notification marked as read", body = MarkReadResponse),
        (status = NOT_FOUND, description = "Unknown or someone else's notification"),
    ),
    security(("token" = [])),
    tag = NOTIFICATIONS_TAG,
)]
pub(crate) async fn mark_read(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let id = ResourceGuard::verify(id, NOTIFICATION)?;
    let notifications = state.slice::<Notifications>()?;
    let notification = notifications.service.mark_read(&user.id, &id).await?;

    Ok(Json(MarkReadResponse { message: "Notification marked as read".to_owned(), notification }))
}

#[api_handler(
    post,
    path = "/mark_all_read",
    responses((status = OK, description = "Every unread notification marked as read", body = CountResponse)),
    security(("token" = [])),
    tag = NOTIFICATIONS_TAG,
)]
pub(crate) async fn mark_all_read(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<CountResponse>, ApiError> {
    let notifications = state.slice::<Notifications>()?;
    let count = notifications.service.mark_all_read(&user.id).await?;

    Ok(Json(CountResponse { message: format!("Marked {count} notification(s) as read"), count }))
}

#[api_handler(
    get,
    path = "/unread_count",
    responses((status = OK, description = "Number of unread notifications", body = UnreadCountResponse)),
    security(("token" = [])),
    tag = NOTIFICATIONS_TAG,
)]
pub(crate) async fn unread_count(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let notifications = state.slice::<Notifications>()?;
    let unread_count = notifications.service.unread_count(&user.id).await?;

    Ok(Json(UnreadCountResponse { unread_count }))
}

#[api_handler(
    post,
    path = "/bulk_action",
    request_body = BulkActionRequest,
    responses(
        (status = OK, description = "Action applied", body = CountResponse),
        (status = BAD_REQUEST, description = "No ids or an unknown action"),
        (status = NOT_FOUND, description = "None of the ids belong to the caller"),
    ),
    security(("token" = [])),
    tag = NOTIFICATIONS_TAG,
)]
pub(crate) async fn bulk_action(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<BulkActionRequest>,
) -> Result<Json<CountResponse>, ApiError> {
    let notifications = state.slice::<Notifications>()?;
    let (message, count) =
        notifications.service.bulk_action(&user.id, request.notification_ids, request.action).await?;

    Ok(Json(CountResponse { message, count }))
}

#[api_handler(
    delete,
    path = "/clear_all",
    responses((status = OK, description = "Every notification of the caller deleted", body = CountResponse)),
    security(("token" = [])),
    tag = NOTIFICATIONS_TAG,
)]
pub(crate) async fn clear_all(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<CountResponse>, ApiError> {
    let notifications = state.slice::<Notifications>()?;
    let count = notifications.service.clear_all(&user.id).await?;

    Ok(Json(CountResponse { message: format!("Deleted all {count} notification(s)"), count }))
}

#[api_handler(
    get,
    path = "/preferences",
    responses((status = OK, description = "The caller's preferences, created on first access", body = PreferenceView)),
    security(("token" = [])),
    tag = NOTIFICATIONS_TAG,
)]
pub(crate) async fn preferences(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<PreferenceView>, ApiError> {
    let notifications = state.slice::<Notifications>()?;

    Ok(Json(notifications.service.preferences(&user.id).await?))
}

#[api_handler(
    method(put, patch),
    path = "/preferences",
    request_body = UpdatePreferencesRequest,
    responses((status = OK, description = "Preferences updated", body = PreferencesUpdateResponse)),
    security(("token" = [])),
    tag = NOTIFICATIONS_TAG,
)]
pub(crate) async fn update_preferences(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    ApiJson(changes): ApiJson<UpdatePreferencesRequest>,
) -> Result<Json<PreferencesUpdateResponse>, ApiError> {
    let notifications = state.slice::<Notifications>()?;
    let preferences = notifications.service.update_preferences(&user.id, changes).await?;

    Ok(Json(PreferencesUpdateResponse {
        message: "Notification preferences updated successfully".to_owned(),
        preferences,
    }))
}
