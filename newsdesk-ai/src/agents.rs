//! Newsroom agents
//!
//! Each operation reports its outcome in an [`AgentResponse`] instead of an
//! `Err`: callers forward the envelope to clients and record failed runs in
//! the agent log like successful ones.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use crate::cleanup::{clean_fact_check, leading_json_or_text, truncate_chars};
use crate::error::AiError;
use crate::fallback::FallbackChain;
use crate::images::{
    search_keywords, DallEClient, GeneratedImage, ImageGenerator, ImageHit, ImageSearch,
    UnsplashClient,
};
use crate::prompts::{self, EditorialGuidelines, WritingSource};
use crate::provider::{ChatRequest, LlmProvider, OpenAiCompatibleProvider, ProviderConfig, Usage};

const RESEARCH_MODEL: &str = "gpt-4";
const FACT_CHECK_MODEL: &str = "gpt-4";
const WRITING_MODEL: &str = "gpt-4-turbo-preview";

/// Longest claim sent to the fact-checker, in characters
pub const MAX_CLAIM_CHARS: usize = 3000;

/// Longest content sample sent for source assessment, in characters
pub const MAX_SOURCE_SAMPLE_CHARS: usize = 500;

/// Photos requested when picking a single image
const FIND_IMAGE_PER_PAGE: u32 = 10;

/// Outcome envelope of one agent run
///
/// On success the payload fields sit beside `success`; on failure only
/// `success` and `error` are present.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub payload: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> AgentResponse<T> {
    pub fn ok(payload: T) -> Self {
        Self { success: true, payload: Some(payload), error: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, payload: None, error: Some(message.into()) }
    }
}

impl<T> From<Result<T, AiError>> for AgentResponse<T> {
    fn from(result: Result<T, AiError>) -> Self {
        match result {
            Ok(payload) => Self::ok(payload),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// Text produced by a language model
#[derive(Debug, Clone, Serialize)]
pub struct TextOutput {
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaptionOutput {
    pub caption: String,
    pub usage: Usage,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageSearchOutput {
    pub images: Vec<ImageHit>,
    pub total: u64,
}

/// Fact-check verdict as stored with an article
#[derive(Debug, Clone, PartialEq)]
pub struct FactCheckVerdict {
    pub verdict: String,
    pub explanation: String,
    pub confidence: f64,
    pub sources: Vec<String>,
}

impl FactCheckVerdict {
    /// Parse the cleaned JSON returned by [`AgentService::fact_check`]
    ///
    /// Missing or mistyped fields fall back to an `unverified` verdict with
    /// zero confidence.
    pub fn parse(data: &str) -> Result<Self, AiError> {
        let value: Value =
            serde_json::from_str(data).map_err(|e| AiError::InvalidJson(e.to_string()))?;

        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            verdict: text("verdict").unwrap_or_else(|| "unverified".to_string()),
            explanation: text("explanation").unwrap_or_default(),
            confidence: value.get("confidence").and_then(Value::as_f64).unwrap_or(0.0),
            sources: value
                .get("sources")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

/// Orchestrates the research, writing, checking and imaging agents
pub struct AgentService {
    chain: FallbackChain,
    images: Arc<dyn ImageSearch>,
    generator: Arc<dyn ImageGenerator>,
}

impl AgentService {
    pub fn new(
        chain: FallbackChain,
        images: Arc<dyn ImageSearch>,
        generator: Arc<dyn ImageGenerator>,
    ) -> Self {
        Self { chain, images, generator }
    }

    /// OpenAI primary, Groq fallback, Unsplash search and DALL·E generation
    ///
    /// Missing keys are not an error here; the affected operations fail
    /// with `NotConfigured` when called.
    pub fn from_keys(
        openai_api_key: Option<String>,
        groq_api_key: Option<String>,
        unsplash_access_key: Option<String>,
    ) -> Result<Self, AiError> {
        let openai = ProviderConfig::openai(openai_api_key);
        let primary = Arc::new(OpenAiCompatibleProvider::new(openai.clone())?);
        let fallback = Arc::new(OpenAiCompatibleProvider::new(ProviderConfig::groq(groq_api_key))?);

        Ok(Self::new(
            FallbackChain::new(primary, fallback),
            Arc::new(UnsplashClient::new(unsplash_access_key)?),
            Arc::new(DallEClient::new(openai)?),
        ))
    }

    fn primary(&self) -> &dyn LlmProvider {
        self.chain.primary().as_ref()
    }

    /// Plain-text research report on `topic`
    pub async fn research(&self, topic: &str, keywords: &[String]) -> AgentResponse<TextOutput> {
        let request = ChatRequest::new(
            RESEARCH_MODEL,
            prompts::RESEARCH_SYSTEM,
            prompts::research(topic, keywords),
        )
        .temperature(0.7)
        .max_tokens(2000);

        let result = self
            .chain
            .run(&request, |text| Ok(text.to_string()))
            .await
            .map(|(data, usage)| TextOutput { data, usage: Some(usage) });

        log_outcome("research", &result);
        result.into()
    }

    /// Full article draft from a brief
    pub async fn write_article(
        &self,
        brief: &str,
        sources: &[WritingSource],
        style: &str,
    ) -> AgentResponse<TextOutput> {
        let request = ChatRequest::new(
            WRITING_MODEL,
            prompts::WRITING_SYSTEM,
            prompts::writing(brief, sources, style),
        )
        .temperature(0.8)
        .max_tokens(3000);

        let result = self
            .chain
            .run(&request, |text| Ok(leading_json_or_text(text)))
            .await
            .map(|(data, usage)| TextOutput { data, usage: Some(usage) });

        log_outcome("writing", &result);
        result.into()
    }

    /// Verdict on a claim as compact JSON
    pub async fn fact_check(&self, claim: &str, context: &str) -> AgentResponse<TextOutput> {
        let claim = truncate_chars(claim, MAX_CLAIM_CHARS);
        let request = ChatRequest::new(
            FACT_CHECK_MODEL,
            prompts::FACT_CHECK_SYSTEM,
            prompts::fact_check(claim, context),
        )
        .temperature(0.3)
        .max_tokens(1500)
        .json_mode(true);

        let result = self
            .chain
            .run(&request, clean_fact_check)
            .await
            .map(|(data, usage)| TextOutput { data, usage: Some(usage) });

        log_outcome("fact-check", &result);
        result.into()
    }

    pub async fn editorial_review(
        &self,
        content: &str,
        guidelines: &EditorialGuidelines,
    ) -> AgentResponse<TextOutput> {
        let request = ChatRequest::new(
            WRITING_MODEL,
            prompts::EDITORIAL_SYSTEM,
            prompts::editorial(content, guidelines),
        )
        .temperature(0.5)
        .max_tokens(2500);

        let result = self
            .primary()
            .complete(&request)
            .await
            .map(|c| TextOutput { data: c.text, usage: Some(c.usage) });

        log_outcome("editorial", &result);
        result.into()
    }

    pub async fn generate_caption(
        &self,
        image_description: &str,
        article_context: &str,
    ) -> AgentResponse<CaptionOutput> {
        let request = ChatRequest::new(
            WRITING_MODEL,
            prompts::CAPTION_SYSTEM,
            prompts::caption(image_description, article_context),
        )
        .temperature(0.7)
        .max_tokens(200);

        let result = self.primary().complete(&request).await.map(|c| CaptionOutput {
            caption: c.text.trim().to_string(),
            usage: c.usage,
        });

        log_outcome("caption", &result);
        result.into()
    }

    /// Credibility assessment of a source from a sample of its content
    pub async fn assess_source(&self, url: &str, content: &str) -> AgentResponse<TextOutput> {
        let sample = truncate_chars(content, MAX_SOURCE_SAMPLE_CHARS);
        let request = ChatRequest::new(
            WRITING_MODEL,
            prompts::CREDIBILITY_SYSTEM,
            prompts::credibility(url, sample),
        )
        .temperature(0.3)
        .max_tokens(800);

        let result = self
            .primary()
            .complete(&request)
            .await
            .map(|c| TextOutput { data: c.text, usage: None });

        log_outcome("source-assessment", &result);
        result.into()
    }

    /// Best stock photo for a description
    ///
    /// `style` is accepted for parity with [`Self::generate_image_dalle`];
    /// stock search ignores it.
    pub async fn find_image(&self, description: &str, _style: &str) -> AgentResponse<ImageHit> {
        let query = search_keywords(description);
        let result = match self.images.search(&query, FIND_IMAGE_PER_PAGE).await {
            Ok(page) => page
                .hits
                .into_iter()
                .next()
                .ok_or_else(|| AiError::NoResults("No images found for this description".to_string())),
            Err(e) => Err(e),
        };

        log_outcome("image-search", &result);
        result.into()
    }

    pub async fn search_images(&self, query: &str, count: u32) -> AgentResponse<ImageSearchOutput> {
        let result = match self.images.search(query, count).await {
            Ok(page) if page.hits.is_empty() => {
                Err(AiError::NoResults("No images found for this query".to_string()))
            }
            Ok(page) => Ok(ImageSearchOutput { images: page.hits, total: page.total }),
            Err(e) => Err(e),
        };

        log_outcome("image-search", &result);
        result.into()
    }

    pub async fn generate_image_dalle(&self, description: &str, style: &str) -> AgentResponse<GeneratedImage> {
        let result = self.generator.generate(&prompts::dalle(description, style)).await;

        log_outcome("image-generation", &result);
        result.into()
    }
}

fn log_outcome<T>(agent: &str, result: &Result<T, AiError>) {
    match result {
        Ok(_) => info!(agent, "Agent run completed"),
        Err(e) => error!(agent, error = %e, "Agent run failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_flattens_payload() {
        let ok = AgentResponse::ok(TextOutput {
            data: "report".to_string(),
            usage: Some(Usage::provider_only("groq")),
        });
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"success": true, "data": "report", "usage": {"provider": "groq"}})
        );

        let failed: AgentResponse<TextOutput> = AgentResponse::failed("boom");
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"success": false, "error": "boom"})
        );
    }

    #[test]
    fn test_fact_check_verdict_defaults() {
        let verdict = FactCheckVerdict::parse(r#"{"explanation": "No record found"}"#).unwrap();
        assert_eq!(verdict.verdict, "unverified");
        assert_eq!(verdict.confidence, 0.0);
        assert!(verdict.sources.is_empty());

        assert!(FactCheckVerdict::parse("not json").is_err());
    }
}
