//! The signed-in user's profile

use axum::{
    extract::State,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;

use newsdesk_common::models::UserProfile;

use super::non_blank;
use crate::auth::AuthUser;
use crate::db::{self, users::UserStats};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

/// GET /api/users/me
pub async fn get_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<UserProfile>> {
    let record = db::users::find_by_id(&state.db, &user.id)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(Json(record.profile()))
}

/// PATCH /api/users/me
///
/// Blank values are ignored.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UserProfile>> {
    let record = db::users::update_profile(
        &state.db,
        &user.id,
        non_blank(request.name.as_deref()),
        non_blank(request.avatar.as_deref()),
    )
    .await?
    .ok_or_else(user_not_found)?;
    Ok(Json(record.profile()))
}

/// GET /api/users/me/stats
pub async fn get_my_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<UserStats>> {
    Ok(Json(db::users::stats(&state.db, &user.id).await?))
}

/// Build profile routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/me", get(get_me).patch(update_me))
        .route("/api/users/me/stats", get(get_my_stats))
}
