//! Article CRUD, review workflow, versions and live updates

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use newsdesk_common::models::{
    Article, ArticleDetail, ArticleImage, ArticleListItem, ArticleStatus, ArticleVersion,
    NotificationKind, Role,
};
use newsdesk_common::sse::article_event_stream;
use newsdesk_common::ArticleEvent;

use super::{non_blank, MessageResponse};
use crate::auth::AuthUser;
use crate::db::{
    self,
    articles::{ArticleChanges, ArticleFilter},
    images::NewImage,
    notifications::NewNotification,
};
use crate::pagination::{PageRequest, Pagination};
use crate::validation::{is_http_url, Validator};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub status: Option<String>,
    pub tags: Option<Vec<String>>,
    pub featured_image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListArticlesQuery {
    pub status: Option<String>,
    pub author_id: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleListItem>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddImageRequest {
    pub url: Option<String>,
    pub caption: Option<String>,
    pub alt_text: Option<String>,
    pub credit: Option<String>,
}

fn article_not_found() -> ApiError {
    ApiError::NotFound("Article not found".to_string())
}

async fn load_article(state: &AppState, id: &str) -> ApiResult<Article> {
    db::articles::find(&state.db, id)
        .await?
        .ok_or_else(article_not_found)
}

/// Author, editors and admins may change an article
fn ensure_can_edit(user: &AuthUser, article: &Article) -> ApiResult<()> {
    if article.author_id == user.id || user.has_role(&[Role::Editor, Role::Admin]) {
        Ok(())
    } else {
        Err(ApiError::insufficient_permissions())
    }
}

/// POST /api/articles
pub async fn create_article(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateArticleRequest>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    Validator::new()
        .required(request.title.as_deref(), "title", "Title is required")
        .finish()?;

    let title = request.title.as_deref().map(str::trim).unwrap_or_default();
    let content = request.content.as_deref().unwrap_or_default();
    let tags = request.tags.unwrap_or_default();

    let article = db::articles::create(&state.db, &user.id, title, content, &tags).await?;
    info!(article_id = %article.id, author_id = %user.id, "Created article");

    Ok((StatusCode::CREATED, Json(article)))
}

/// GET /api/articles
pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListArticlesQuery>,
) -> ApiResult<Json<ArticleListResponse>> {
    let status = match non_blank(query.status.as_deref()) {
        Some(status) => Some(
            status
                .parse::<ArticleStatus>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid status: {}", status)))?,
        ),
        None => None,
    };

    let filter = ArticleFilter {
        status,
        author_id: non_blank(query.author_id.as_deref()).map(str::to_string),
        search: query.search,
    };
    let page = PageRequest::new(query.page, query.limit);

    let (articles, total) = db::articles::list(&state.db, &filter, page).await?;

    Ok(Json(ArticleListResponse {
        articles,
        pagination: page.paginate(total),
    }))
}

/// GET /api/articles/:id
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ArticleDetail>> {
    db::articles::detail(&state.db, &id)
        .await?
        .map(Json)
        .ok_or_else(article_not_found)
}

/// PATCH /api/articles/:id
///
/// A content change first snapshots the previous title and content as a new
/// version. Open sessions on the article receive `article-updated`.
pub async fn update_article(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateArticleRequest>,
) -> ApiResult<Json<Article>> {
    let existing = load_article(&state, &id).await?;
    ensure_can_edit(&user, &existing)?;

    let status = request
        .status
        .as_deref()
        .map(str::parse::<ArticleStatus>)
        .transpose();

    Validator::new()
        .check(
            request.title.as_deref().map(|t| !t.trim().is_empty()).unwrap_or(true),
            "title",
            "Title cannot be empty",
        )
        .check(status.is_ok(), "status", "Invalid status")
        .finish()?;

    // Blank fields are left unchanged; content keeps its own whitespace
    let changes = ArticleChanges {
        title: request.title.map(|t| t.trim().to_string()),
        content: request.content.filter(|c| !c.trim().is_empty()),
        summary: non_blank(request.summary.as_deref()).map(str::to_string),
        status: status.ok().flatten(),
        tags: request.tags,
        featured_image: non_blank(request.featured_image.as_deref()).map(str::to_string),
    };

    let article = db::articles::update(&state.db, &id, &changes, &user.id)
        .await?
        .ok_or_else(article_not_found)?;

    state.hub.broadcast(
        &id,
        ArticleEvent::ArticleUpdated {
            article: article.clone(),
            updated_by: user.id.clone(),
        },
    );

    Ok(Json(article))
}

/// DELETE /api/articles/:id
pub async fn delete_article(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let existing = load_article(&state, &id).await?;
    if existing.author_id != user.id && !user.has_role(&[Role::Admin]) {
        return Err(ApiError::insufficient_permissions());
    }

    db::articles::delete(&state.db, &id).await?;
    info!(article_id = %id, deleted_by = %user.id, "Deleted article");

    Ok(Json(MessageResponse::new("Article deleted successfully")))
}

/// POST /api/articles/:id/submit
///
/// Moves the article to IN_REVIEW and notifies every editor.
pub async fn submit_for_review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Article>> {
    let existing = load_article(&state, &id).await?;
    if existing.author_id != user.id && !user.has_role(&[Role::Admin]) {
        return Err(ApiError::Forbidden(
            "Only the author or admin can submit for review".to_string(),
        ));
    }

    let article = db::articles::set_status(&state.db, &id, ArticleStatus::InReview)
        .await?
        .ok_or_else(article_not_found)?;

    let editors = db::users::ids_with_role(&state.db, Role::Editor).await?;
    let message = format!("Article \"{}\" was submitted for review.", article.title);
    let link = format!("/articles/{}", article.id);
    let notified = db::notifications::create_many(
        &state.db,
        &editors,
        &NewNotification {
            kind: NotificationKind::Review,
            title: "Article submitted for review",
            message: &message,
            link: Some(&link),
        },
    )
    .await?;

    info!(article_id = %id, editors = notified, "Article submitted for review");
    Ok(Json(article))
}

/// POST /api/articles/:id/publish
pub async fn publish_article(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Article>> {
    user.require_role(&[Role::Editor, Role::Admin])?;

    let article = db::articles::publish(&state.db, &id)
        .await?
        .ok_or_else(article_not_found)?;

    state.hub.broadcast(
        &id,
        ArticleEvent::ArticlePublished {
            article: article.clone(),
        },
    );
    info!(article_id = %id, published_by = %user.id, "Published article");

    Ok(Json(article))
}

/// GET /api/articles/:id/versions
pub async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ArticleVersion>>> {
    if !db::articles::exists(&state.db, &id).await? {
        return Err(article_not_found());
    }
    Ok(Json(db::articles::versions(&state.db, &id).await?))
}

/// POST /api/articles/:id/images
pub async fn add_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(request): Json<AddImageRequest>,
) -> ApiResult<(StatusCode, Json<ArticleImage>)> {
    let existing = load_article(&state, &id).await?;
    ensure_can_edit(&user, &existing)?;

    let url = request.url.as_deref().map(str::trim).unwrap_or_default();
    Validator::new()
        .check(
            is_http_url(url) || url.starts_with("/uploads/"),
            "url",
            "Image URL must be an http(s) URL or an uploaded file path",
        )
        .finish()?;

    let image = db::images::add(
        &state.db,
        &id,
        &NewImage {
            url: url.to_string(),
            caption: request.caption,
            alt_text: request.alt_text,
            credit: request.credit,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(image)))
}

/// GET /api/articles/stream/:articleId
///
/// Server-Sent Events stream of live updates for one article. Browsers pass
/// the token as `?token=` because `EventSource` cannot set headers.
pub async fn article_stream(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(article_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if !db::articles::exists(&state.db, &article_id).await? {
        return Err(article_not_found());
    }
    Ok(article_event_stream(state.hub.subscribe(&article_id, &user.id)))
}

/// Build article routes
pub fn article_routes() -> Router<AppState> {
    Router::new()
        .route("/api/articles", get(list_articles).post(create_article))
        .route("/api/articles/stream/:articleId", get(article_stream))
        .route(
            "/api/articles/:id",
            get(get_article).patch(update_article).delete(delete_article),
        )
        .route("/api/articles/:id/submit", post(submit_for_review))
        .route("/api/articles/:id/publish", post(publish_article))
        .route("/api/articles/:id/versions", get(list_versions))
        .route("/api/articles/:id/images", post(add_image))
}
