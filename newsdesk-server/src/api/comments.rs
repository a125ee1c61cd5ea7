//! Comment threads on articles

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use tracing::debug;

use newsdesk_common::models::{Comment, NotificationKind, Role};
use newsdesk_common::ArticleEvent;

use super::{non_blank, MessageResponse};
use crate::auth::AuthUser;
use crate::db::{self, notifications::NewNotification};
use crate::validation::Validator;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub article_id: Option<String>,
    pub content: Option<String>,
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: Option<String>,
    pub resolved: Option<bool>,
}

fn comment_not_found() -> ApiError {
    ApiError::NotFound("Comment not found".to_string())
}

async fn load_comment(state: &AppState, id: &str) -> ApiResult<Comment> {
    db::comments::find(&state.db, id)
        .await?
        .ok_or_else(comment_not_found)
}

/// POST /api/comments
///
/// Notifies the article author (unless they wrote the comment) and pushes
/// `comment-added` to open sessions on the article.
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    Validator::new()
        .required(request.article_id.as_deref(), "articleId", "Article ID is required")
        .required(request.content.as_deref(), "content", "Content is required")
        .finish()?;

    let article_id = request.article_id.as_deref().map(str::trim).unwrap_or_default();
    let content = request.content.as_deref().map(str::trim).unwrap_or_default();

    let article = db::articles::find(&state.db, article_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Article not found".to_string()))?;

    let parent_id = non_blank(request.parent_id.as_deref());
    if let Some(parent_id) = parent_id {
        let parent_article = db::comments::article_of(&state.db, parent_id).await?;
        if parent_article.as_deref() != Some(article.id.as_str()) {
            return Err(ApiError::BadRequest(
                "Parent comment must belong to the same article".to_string(),
            ));
        }
    }

    let comment =
        db::comments::create(&state.db, &article.id, &user.id, content, parent_id).await?;

    if article.author_id != user.id {
        let message = format!("{} commented on your article", user.name);
        let link = format!("/articles/{}", article.id);
        db::notifications::create(
            &state.db,
            &article.author_id,
            &NewNotification {
                kind: NotificationKind::Comment,
                title: "New Comment",
                message: &message,
                link: Some(&link),
            },
        )
        .await?;
    }

    let delivered = state.hub.broadcast(
        &article.id,
        ArticleEvent::CommentAdded {
            comment: comment.clone(),
        },
    );
    debug!(comment_id = %comment.id, delivered, "Comment added");

    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /api/comments/article/:articleId
pub async fn list_for_article(
    State(state): State<AppState>,
    Path(article_id): Path<String>,
) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(
        db::comments::threads_for_article(&state.db, &article_id).await?,
    ))
}

/// PATCH /api/comments/:id
///
/// Only the comment's author may edit it; blank content is ignored.
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    let existing = load_comment(&state, &id).await?;
    if existing.user_id != user.id {
        return Err(ApiError::insufficient_permissions());
    }

    let comment = db::comments::update(
        &state.db,
        &id,
        non_blank(request.content.as_deref()),
        request.resolved,
    )
    .await?
    .ok_or_else(comment_not_found)?;

    Ok(Json(comment))
}

/// DELETE /api/comments/:id
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let existing = load_comment(&state, &id).await?;
    if existing.user_id != user.id && !user.has_role(&[Role::Admin]) {
        return Err(ApiError::insufficient_permissions());
    }

    db::comments::delete(&state.db, &id).await?;
    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}

/// Build comment routes
pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/api/comments", post(create_comment))
        .route("/api/comments/article/:articleId", get(list_for_article))
        .route("/api/comments/:id", patch(update_comment).delete(delete_comment))
}
