//! Registration and login

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use newsdesk_common::models::{Role, UserProfile};

use crate::auth::{hash_password, issue_token, verify_password};
use crate::db;
use crate::validation::{is_valid_email, normalize_email, Validator};
use crate::{ApiError, ApiResult, AppState};

/// Minimum password length in characters
pub const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token plus the signed-in user's profile
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let email = request.email.as_deref().map(normalize_email).unwrap_or_default();
    let password = request.password.unwrap_or_default();
    let name = request.name.as_deref().map(str::trim).unwrap_or_default().to_string();
    let role = match request.role.as_deref() {
        None => Some(Role::Writer),
        Some(role) => role.parse::<Role>().ok(),
    };

    Validator::new()
        .check(is_valid_email(&email), "email", "Valid email is required")
        .check(
            password.chars().count() >= MIN_PASSWORD_CHARS,
            "password",
            "Password must be at least 6 characters",
        )
        .check(!name.is_empty(), "name", "Name is required")
        .check(role.is_some(), "role", "Role must be WRITER, EDITOR or ADMIN")
        .finish()?;
    let role = role.unwrap_or(Role::Writer);

    let email_taken = || ApiError::Conflict("Email already registered".to_string());

    if db::users::find_by_email(&state.db, &email).await?.is_some() {
        return Err(email_taken());
    }

    let password_hash = hash_password(&password)?;
    // A concurrent registration can still win the insert
    let user = db::users::create(&state.db, &email, &password_hash, &name, role)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                email_taken()
            } else {
                ApiError::from(e)
            }
        })?;

    if role != Role::Writer {
        warn!(user_id = %user.id, role = role.as_str(), "Account registered with elevated role");
    }
    info!(user_id = %user.id, "Registered new user");

    let token = issue_token(&user.id, &user.email, user.role, &state.auth)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.profile(),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = request.email.as_deref().map(normalize_email).unwrap_or_default();
    let password = request.password.unwrap_or_default();

    Validator::new()
        .check(is_valid_email(&email), "email", "Valid email is required")
        .check(!password.is_empty(), "password", "Password is required")
        .finish()?;

    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let user = db::users::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(invalid)?;

    let password_ok = user
        .password_hash
        .as_deref()
        .map(|hash| verify_password(&password, hash))
        .unwrap_or(false);
    if !password_ok {
        return Err(invalid());
    }

    let token = issue_token(&user.id, &user.email, user.role, &state.auth)?;
    Ok(Json(AuthResponse {
        token,
        user: user.profile(),
    }))
}

/// Build authentication routes (public)
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}
