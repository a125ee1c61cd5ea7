//! The signed-in user's notifications

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use newsdesk_common::models::Notification;

use super::MessageResponse;
use crate::auth::AuthUser;
use crate::db;
use crate::{ApiError, ApiResult, AppState};

pub const DEFAULT_NOTIFICATION_LIMIT: i64 = 20;
pub const MAX_NOTIFICATION_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsQuery {
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
}

fn notification_not_found() -> ApiError {
    ApiError::NotFound("Notification not found".to_string())
}

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListNotificationsQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
        .clamp(1, MAX_NOTIFICATION_LIMIT);

    let notifications = db::notifications::list(
        &state.db,
        &user.id,
        query.unread_only.unwrap_or(false),
        limit,
    )
    .await?;

    Ok(Json(notifications))
}

/// PATCH /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Notification>> {
    db::notifications::mark_read(&state.db, &id, &user.id)
        .await?
        .map(Json)
        .ok_or_else(notification_not_found)
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<MessageResponse>> {
    db::notifications::mark_all_read(&state.db, &user.id).await?;
    Ok(Json(MessageResponse::new("All notifications marked as read")))
}

/// DELETE /api/notifications/:id
pub async fn delete_notification(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    if !db::notifications::delete(&state.db, &id, &user.id).await? {
        return Err(notification_not_found());
    }
    Ok(Json(MessageResponse::new("Notification deleted")))
}

/// Build notification routes
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/read-all", post(mark_all_read))
        .route("/api/notifications/:id/read", patch(mark_read))
        .route("/api/notifications/:id", delete(delete_notification))
}
