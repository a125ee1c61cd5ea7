//! HTTP API handlers for newsdesk-server
//!
//! Each module exposes a `*_routes()` builder; [`crate::build_router`]
//! decides which of them sit behind the authentication middleware.

pub mod ai;
pub mod articles;
pub mod auth;
pub mod comments;
pub mod health;
pub mod notifications;
pub mod sources;
pub mod users;

pub use ai::ai_routes;
pub use articles::article_routes;
pub use auth::auth_routes;
pub use comments::comment_routes;
pub use health::health_routes;
pub use notifications::notification_routes;
pub use sources::source_routes;
pub use users::user_routes;

use serde::Serialize;

/// `{"message": ...}` acknowledgement body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Trimmed value, or `None` when absent or blank
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
