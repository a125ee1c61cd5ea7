//! LLM provider abstraction and the OpenAI-compatible client
//!
//! OpenAI and Groq both expose the Chat Completions API, so one client type
//! serves both; [`ProviderConfig`] carries the per-vendor differences.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::AiError;

/// OpenAI API base URL
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Groq OpenAI-compatible API base URL
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Model used for every Groq request
pub const GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Default timeout for completion requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// A single system + user prompt
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask for a JSON object response where the provider supports it
    pub json_mode: bool,
}

impl ChatRequest {
    pub fn new(model: &str, system: &str, user: String) -> Self {
        Self {
            model: model.to_string(),
            system: system.to_string(),
            user,
            temperature: 0.7,
            max_tokens: 2000,
            json_mode: false,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }
}

/// Token accounting for one completion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

impl Usage {
    pub fn provider_only(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            ..Default::default()
        }
    }
}

/// Text produced by a provider
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Usage,
}

/// Main trait for chat-completion providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one completion
    async fn complete(&self, request: &ChatRequest) -> Result<Completion, AiError>;

    /// Provider name for logs and usage records
    fn name(&self) -> &str;
}

/// Per-vendor settings for [`OpenAiCompatibleProvider`]
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub base_url: String,
    pub api_key: Option<String>,
    /// Replaces the requested model (vendors that serve a single model family)
    pub model_override: Option<String>,
    /// Whether `response_format: json_object` may be sent
    pub supports_json_mode: bool,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn openai(api_key: Option<String>) -> Self {
        Self {
            name: "openai".to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            api_key,
            model_override: None,
            supports_json_mode: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn groq(api_key: Option<String>) -> Self {
        Self {
            name: "groq".to_string(),
            base_url: GROQ_BASE_URL.to_string(),
            api_key,
            model_override: Some(GROQ_MODEL.to_string()),
            supports_json_mode: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Key to send, or `NotConfigured`
    pub fn require_key(&self) -> Result<&str, AiError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AiError::NotConfigured(self.name.clone()))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

/// Chat Completions client for OpenAI and compatible vendors
pub struct OpenAiCompatibleProvider {
    config: ProviderConfig,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, AiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<Completion, AiError> {
        let api_key = self.config.require_key()?;
        let model = self.config.model_override.as_deref().unwrap_or(&request.model);

        let body = ChatCompletionsRequest {
            model,
            messages: vec![
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.user },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: (request.json_mode && self.config.supports_json_mode)
                .then_some(ResponseFormat { format_type: "json_object" }),
        };

        debug!(provider = %self.config.name, model, "Sending chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AiError::Api {
                provider: self.config.name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionsResponse = response.json().await?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AiError::EmptyResponse(self.config.name.clone()))?;

        let usage = match parsed.usage {
            Some(u) => Usage {
                provider: self.config.name.clone(),
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            },
            None => Usage::provider_only(&self.config.name),
        };

        Ok(Completion { text, usage })
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}
