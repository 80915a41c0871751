use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};

use crate::{
    dto::notifications::{NotificationFeed, UnreadCount},
    error::AppResult,
    middleware::auth::CurrentUser,
    response::ApiResponse,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread", get(unread_count))
        .route("/read-all", post(mark_all_read))
        .route("/{id}/read", post(mark_read))
        .route("/{id}", delete(delete_notification))
}

#[utoipa::path(
    get,
    path = "/notifications",
    responses(
        (status = 200, description = "Notifications for the signed-in user", body = ApiResponse<NotificationFeed>),
        (status = 401, description = "No session"),
    ),
    tag = "Notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<ApiResponse<NotificationFeed>>> {
    state.notifications.fetch().await?;
    Ok(Json(ApiResponse::success("OK", state.notifications.feed(), None)))
}

#[utoipa::path(
    get,
    path = "/notifications/unread",
    responses(
        (status = 200, description = "Last polled unread count", body = ApiResponse<UnreadCount>),
    ),
    tag = "Notifications"
)]
pub async fn unread_count(State(state): State<AppState>) -> Json<ApiResponse<UnreadCount>> {
    let data = UnreadCount {
        count: state.notifications.unread_count(),
    };
    Json(ApiResponse::success("OK", data, None))
}

#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Feed after the change; `error` is set if the request failed", body = ApiResponse<NotificationFeed>),
    ),
    tag = "Notifications"
)]
pub async fn mark_read(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Json<ApiResponse<NotificationFeed>> {
    state.notifications.mark_as_read(&id).await;
    Json(ApiResponse::success("OK", state.notifications.feed(), None))
}

#[utoipa::path(
    post,
    path = "/notifications/read-all",
    responses(
        (status = 200, description = "Feed after the change", body = ApiResponse<NotificationFeed>),
    ),
    tag = "Notifications"
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Json<ApiResponse<NotificationFeed>> {
    state.notifications.mark_all_as_read().await;
    Json(ApiResponse::success("OK", state.notifications.feed(), None))
}

#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    params(("id" = String, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Feed after the change", body = ApiResponse<NotificationFeed>),
    ),
    tag = "Notifications"
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Json<ApiResponse<NotificationFeed>> {
    state.notifications.delete(&id).await;
    Json(ApiResponse::success("OK", state.notifications.feed(), None))
}
