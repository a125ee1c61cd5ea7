//! newsdesk-server library - newsroom content-management API
//!
//! Exposes the router and application state so integration tests can drive
//! the full HTTP stack without binding a socket.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;

use newsdesk_ai::AgentService;
use newsdesk_common::ArticleHub;

pub mod api;
pub mod auth;
pub mod db;
pub mod error;
pub mod pagination;
pub mod validation;

pub use auth::AuthSettings;
pub use error::{ApiError, ApiResult};

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Live-update fan-out for open article sessions
    pub hub: ArticleHub,
    /// AI research, writing, fact-check and image agents
    pub agents: Arc<AgentService>,
    /// Token signing settings
    pub auth: AuthSettings,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, agents: AgentService, auth: AuthSettings) -> Self {
        Self {
            db,
            hub: ArticleHub::default(),
            agents: Arc::new(agents),
            auth,
        }
    }
}

/// Build application router
///
/// Health and auth routes are public; everything else requires a valid
/// bearer token.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    // Protected routes (require authentication)
    let protected = Router::new()
        .merge(api::user_routes())
        .merge(api::article_routes())
        .merge(api::comment_routes())
        .merge(api::notification_routes())
        .merge(api::source_routes())
        .merge(api::ai_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .merge(api::auth_routes())
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
