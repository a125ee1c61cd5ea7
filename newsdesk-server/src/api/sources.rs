//! Research sources and citations

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use newsdesk_common::models::{Citation, Source};

use super::{non_blank, MessageResponse};
use crate::db::{
    self,
    sources::{NewCitation, NewSource},
};
use crate::validation::{is_http_url, Validator};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSourceRequest {
    pub article_id: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub published_at: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSourceRequest {
    pub credibility_score: Option<f64>,
    pub summary: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCitationRequest {
    pub article_id: Option<String>,
    pub source_id: Option<String>,
    pub quote: Option<String>,
    pub context: Option<String>,
    pub position: Option<i64>,
}

fn source_not_found() -> ApiError {
    ApiError::NotFound("Source not found".to_string())
}

/// RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC)
fn parse_published_at(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

async fn ensure_article(state: &AppState, article_id: &str) -> ApiResult<()> {
    if db::articles::exists(&state.db, article_id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound("Article not found".to_string()))
    }
}

/// POST /api/sources
pub async fn create_source(
    State(state): State<AppState>,
    Json(request): Json<CreateSourceRequest>,
) -> ApiResult<(StatusCode, Json<Source>)> {
    let url = request.url.as_deref().map(str::trim).unwrap_or_default();
    let published_at = non_blank(request.published_at.as_deref()).map(parse_published_at);

    Validator::new()
        .required(request.article_id.as_deref(), "articleId", "Article ID is required")
        .check(is_http_url(url), "url", "Valid URL is required")
        .required(request.title.as_deref(), "title", "Title is required")
        .check(
            !matches!(published_at, Some(None)),
            "publishedAt",
            "Published date must be an ISO 8601 date",
        )
        .finish()?;

    let article_id = request.article_id.as_deref().map(str::trim).unwrap_or_default();
    ensure_article(&state, article_id).await?;

    let source = db::sources::create(
        &state.db,
        article_id,
        &NewSource {
            url: url.to_string(),
            title: request.title.as_deref().map(str::trim).unwrap_or_default().to_string(),
            publisher: non_blank(request.publisher.as_deref()).map(str::to_string),
            published_at: published_at.flatten(),
            summary: non_blank(request.summary.as_deref()).map(str::to_string),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(source)))
}

/// GET /api/sources/article/:articleId
pub async fn list_for_article(
    State(state): State<AppState>,
    Path(article_id): Path<String>,
) -> ApiResult<Json<Vec<Source>>> {
    Ok(Json(
        db::sources::list_for_article(&state.db, &article_id, true).await?,
    ))
}

/// PATCH /api/sources/:id
pub async fn update_source(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSourceRequest>,
) -> ApiResult<Json<Source>> {
    Validator::new()
        .check(
            request
                .credibility_score
                .map(|score| (0.0..=1.0).contains(&score))
                .unwrap_or(true),
            "credibilityScore",
            "Credibility score must be between 0 and 1",
        )
        .finish()?;

    db::sources::update(
        &state.db,
        &id,
        request.credibility_score,
        non_blank(request.summary.as_deref()),
    )
    .await?
    .map(Json)
    .ok_or_else(source_not_found)
}

/// DELETE /api/sources/:id
pub async fn delete_source(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    if !db::sources::delete(&state.db, &id).await? {
        return Err(source_not_found());
    }
    Ok(Json(MessageResponse::new("Source deleted successfully")))
}

/// POST /api/sources/citations
pub async fn create_citation(
    State(state): State<AppState>,
    Json(request): Json<CreateCitationRequest>,
) -> ApiResult<(StatusCode, Json<Citation>)> {
    Validator::new()
        .required(request.article_id.as_deref(), "articleId", "Article ID is required")
        .required(request.source_id.as_deref(), "sourceId", "Source ID is required")
        .required(request.quote.as_deref(), "quote", "Quote is required")
        .check(
            request.position.map(|p| p >= 0).unwrap_or(true),
            "position",
            "Position must not be negative",
        )
        .finish()?;

    let article_id = request.article_id.as_deref().map(str::trim).unwrap_or_default();
    let source_id = request.source_id.as_deref().map(str::trim).unwrap_or_default();
    ensure_article(&state, article_id).await?;

    let source = db::sources::find(&state.db, source_id)
        .await?
        .ok_or_else(source_not_found)?;
    if source.article_id != article_id {
        return Err(ApiError::BadRequest(
            "Source does not belong to this article".to_string(),
        ));
    }

    let citation = db::sources::create_citation(
        &state.db,
        article_id,
        &NewCitation {
            source_id: source.id,
            quote: request.quote.unwrap_or_default(),
            context: non_blank(request.context.as_deref()).map(str::to_string),
            position: request.position,
        },
    )
    .await?
    .ok_or_else(source_not_found)?;

    Ok((StatusCode::CREATED, Json(citation)))
}

/// Build source and citation routes
pub fn source_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sources", post(create_source))
        .route("/api/sources/citations", post(create_citation))
        .route("/api/sources/article/:articleId", get(list_for_article))
        .route("/api/sources/:id", patch(update_source).delete(delete_source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_published_at() {
        let ts = parse_published_at("2024-03-01T12:30:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T10:30:00+00:00");

        let date = parse_published_at("2024-03-01").unwrap();
        assert_eq!(date.to_rfc3339(), "2024-03-01T00:00:00+00:00");

        assert!(parse_published_at("March 1st").is_none());
    }
}
