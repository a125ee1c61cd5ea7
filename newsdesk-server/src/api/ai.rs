//! AI assistant endpoints
//!
//! Every route answers 200 with the agent's `{success, ..., error?}` body,
//! including when the agent itself failed. When the request names an
//! `articleId`, research, writing, fact-check and editorial runs are
//! recorded in the article's agent log.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use newsdesk_ai::{
    AgentResponse, CaptionOutput, EditorialGuidelines, FactCheckVerdict, GeneratedImage, ImageHit,
    ImageSearchOutput, TextOutput, WritingSource,
};
use newsdesk_common::models::AgentType;

use super::non_blank;
use crate::db::{
    self,
    agent_logs::{NewAgentLog, NewFactCheck},
};
use crate::validation::Validator;
use crate::{ApiError, ApiResult, AppState};

pub const DEFAULT_WRITING_STYLE: &str = "professional";
pub const DEFAULT_IMAGE_STYLE: &str = "photorealistic";
pub const DEFAULT_IMAGE_COUNT: u32 = 5;
/// Largest page the stock photo search accepts
pub const MAX_IMAGE_COUNT: u32 = 30;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchRequest {
    pub topic: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub article_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateArticleRequest {
    pub brief: Option<String>,
    #[serde(default)]
    pub sources: Vec<WritingSource>,
    pub style: Option<String>,
    pub article_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactCheckRequest {
    pub claim: Option<String>,
    pub context: Option<String>,
    pub article_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorialReviewRequest {
    pub content: Option<String>,
    #[serde(default)]
    pub guidelines: EditorialGuidelines,
    pub article_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub description: Option<String>,
    pub style: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchImagesRequest {
    pub query: Option<String>,
    pub count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionRequest {
    pub image_description: Option<String>,
    pub article_context: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessSourceRequest {
    pub source_url: Option<String>,
    pub source_content: Option<String>,
}

/// Article the run should be logged against, after checking it exists
async fn log_target(state: &AppState, article_id: Option<&str>) -> ApiResult<Option<String>> {
    let Some(id) = non_blank(article_id) else {
        return Ok(None);
    };
    if db::articles::exists(&state.db, id).await? {
        Ok(Some(id.to_string()))
    } else {
        Err(ApiError::NotFound("Article not found".to_string()))
    }
}

/// Write one agent log row for a text-producing run
async fn record_run(
    state: &AppState,
    article_id: &str,
    agent_type: AgentType,
    input: Value,
    response: &AgentResponse<TextOutput>,
) -> ApiResult<()> {
    let payload = response.payload.as_ref();
    let metadata = payload
        .and_then(|p| p.usage.as_ref())
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| ApiError::Internal(format!("Failed to encode usage: {}", e)))?;

    db::agent_logs::record(
        &state.db,
        &NewAgentLog {
            article_id,
            agent_type,
            input,
            output: payload.map(|p| p.data.clone()),
            succeeded: response.success,
            error_message: response.error.clone(),
            metadata,
        },
    )
    .await?;
    Ok(())
}

/// POST /api/ai/research
pub async fn research(
    State(state): State<AppState>,
    Json(request): Json<ResearchRequest>,
) -> ApiResult<Json<AgentResponse<TextOutput>>> {
    Validator::new()
        .required(request.topic.as_deref(), "topic", "Topic is required")
        .finish()?;
    let article_id = log_target(&state, request.article_id.as_deref()).await?;
    let topic = request.topic.unwrap_or_default();

    let response = state.agents.research(&topic, &request.keywords).await;

    if let Some(article_id) = article_id {
        let input = json!({ "topic": topic, "keywords": request.keywords });
        record_run(&state, &article_id, AgentType::Research, input, &response).await?;
    }
    Ok(Json(response))
}

/// POST /api/ai/generate-article
pub async fn generate_article(
    State(state): State<AppState>,
    Json(request): Json<GenerateArticleRequest>,
) -> ApiResult<Json<AgentResponse<TextOutput>>> {
    Validator::new()
        .required(request.brief.as_deref(), "brief", "Brief is required")
        .finish()?;
    let article_id = log_target(&state, request.article_id.as_deref()).await?;
    let brief = request.brief.unwrap_or_default();
    let style = non_blank(request.style.as_deref()).unwrap_or(DEFAULT_WRITING_STYLE);

    let response = state.agents.write_article(&brief, &request.sources, style).await;

    if let Some(article_id) = article_id {
        let input = json!({ "brief": brief, "style": style });
        record_run(&state, &article_id, AgentType::Writing, input, &response).await?;
    }
    Ok(Json(response))
}

/// POST /api/ai/fact-check
///
/// A successful check against an article also stores the verdict.
pub async fn fact_check(
    State(state): State<AppState>,
    Json(request): Json<FactCheckRequest>,
) -> ApiResult<Json<AgentResponse<TextOutput>>> {
    Validator::new()
        .required(request.claim.as_deref(), "claim", "Claim is required")
        .finish()?;
    let article_id = log_target(&state, request.article_id.as_deref()).await?;
    let claim = request.claim.unwrap_or_default();
    let context = request.context.unwrap_or_default();

    let response = state.agents.fact_check(&claim, &context).await;

    let Some(article_id) = article_id else {
        return Ok(Json(response));
    };
    let Some(output) = response.payload.as_ref().filter(|_| response.success) else {
        return Ok(Json(response));
    };

    match FactCheckVerdict::parse(&output.data) {
        Ok(verdict) => {
            db::agent_logs::record_fact_check(
                &state.db,
                &NewFactCheck {
                    article_id: &article_id,
                    claim: &claim,
                    verdict: &verdict.verdict,
                    explanation: &verdict.explanation,
                    confidence: verdict.confidence,
                    sources: &verdict.sources,
                },
            )
            .await?;
        }
        Err(e) => warn!(article_id = %article_id, error = %e, "Fact-check verdict not stored"),
    }

    let input = json!({ "claim": claim, "context": context });
    record_run(&state, &article_id, AgentType::FactChecking, input, &response).await?;

    Ok(Json(response))
}

/// POST /api/ai/editorial-review
///
/// The log records the content length rather than the content.
pub async fn editorial_review(
    State(state): State<AppState>,
    Json(request): Json<EditorialReviewRequest>,
) -> ApiResult<Json<AgentResponse<TextOutput>>> {
    Validator::new()
        .required(request.content.as_deref(), "content", "Content is required")
        .finish()?;
    let article_id = log_target(&state, request.article_id.as_deref()).await?;
    let content = request.content.unwrap_or_default();

    let response = state
        .agents
        .editorial_review(&content, &request.guidelines)
        .await;

    if let Some(article_id) = article_id {
        let input = json!({
            "contentLength": content.chars().count(),
            "guidelines": request.guidelines,
        });
        record_run(&state, &article_id, AgentType::Editorial, input, &response).await?;
    }
    Ok(Json(response))
}

/// POST /api/ai/generate-image
///
/// Picks the best matching stock photo.
pub async fn generate_image(
    State(state): State<AppState>,
    Json(request): Json<ImageRequest>,
) -> ApiResult<Json<AgentResponse<ImageHit>>> {
    Validator::new()
        .required(request.description.as_deref(), "description", "Description is required")
        .finish()?;
    let description = request.description.unwrap_or_default();
    let style = non_blank(request.style.as_deref()).unwrap_or(DEFAULT_IMAGE_STYLE);

    Ok(Json(state.agents.find_image(&description, style).await))
}

/// POST /api/ai/search-images
pub async fn search_images(
    State(state): State<AppState>,
    Json(request): Json<SearchImagesRequest>,
) -> ApiResult<Json<AgentResponse<ImageSearchOutput>>> {
    Validator::new()
        .required(request.query.as_deref(), "query", "Query is required")
        .finish()?;
    let query = request.query.unwrap_or_default();
    let count = request
        .count
        .unwrap_or(DEFAULT_IMAGE_COUNT)
        .clamp(1, MAX_IMAGE_COUNT);

    Ok(Json(state.agents.search_images(query.trim(), count).await))
}

/// POST /api/ai/generate-image-dalle
pub async fn generate_image_dalle(
    State(state): State<AppState>,
    Json(request): Json<ImageRequest>,
) -> ApiResult<Json<AgentResponse<GeneratedImage>>> {
    Validator::new()
        .required(request.description.as_deref(), "description", "Description is required")
        .finish()?;
    let description = request.description.unwrap_or_default();
    let style = non_blank(request.style.as_deref()).unwrap_or(DEFAULT_IMAGE_STYLE);

    Ok(Json(state.agents.generate_image_dalle(&description, style).await))
}

/// POST /api/ai/generate-caption
pub async fn generate_caption(
    State(state): State<AppState>,
    Json(request): Json<CaptionRequest>,
) -> ApiResult<Json<AgentResponse<CaptionOutput>>> {
    Validator::new()
        .required(
            request.image_description.as_deref(),
            "imageDescription",
            "Image description is required",
        )
        .finish()?;
    let description = request.image_description.unwrap_or_default();
    let context = request.article_context.unwrap_or_default();

    Ok(Json(state.agents.generate_caption(&description, &context).await))
}

/// POST /api/ai/assess-source
pub async fn assess_source(
    State(state): State<AppState>,
    Json(request): Json<AssessSourceRequest>,
) -> ApiResult<Json<AgentResponse<TextOutput>>> {
    Validator::new()
        .required(request.source_url.as_deref(), "sourceUrl", "Source URL is required")
        .required(
            request.source_content.as_deref(),
            "sourceContent",
            "Source content is required",
        )
        .finish()?;
    let url = request.source_url.unwrap_or_default();
    let content = request.source_content.unwrap_or_default();

    Ok(Json(state.agents.assess_source(url.trim(), &content).await))
}

/// Build AI assistant routes
pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ai/research", post(research))
        .route("/api/ai/generate-article", post(generate_article))
        .route("/api/ai/fact-check", post(fact_check))
        .route("/api/ai/editorial-review", post(editorial_review))
        .route("/api/ai/generate-image", post(generate_image))
        .route("/api/ai/search-images", post(search_images))
        .route("/api/ai/generate-image-dalle", post(generate_image_dalle))
        .route("/api/ai/generate-caption", post(generate_caption))
        .route("/api/ai/assess-source", post(assess_source))
}
