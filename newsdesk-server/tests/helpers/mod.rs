//! Shared helpers for newsdesk-server integration tests
//!
//! Builds the real router over an in-memory database with scripted AI
//! providers, plus request builders and account setup.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::util::ServiceExt;

use newsdesk_ai::{
    AgentService, AiError, ChatRequest, Completion, FallbackChain, GeneratedImage, ImageGenerator,
    ImageHit, ImageSearch, ImageSearchPage, LlmProvider, Usage,
};
use newsdesk_common::ArticleHub;
use newsdesk_server::{build_router, AppState, AuthSettings};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Provider answering every request with the same text
pub struct ScriptedProvider {
    reply: String,
    pub requests: Mutex<Vec<ChatRequest>>,
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<Completion, AiError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(Completion {
            text: self.reply.clone(),
            usage: Usage {
                provider: "openai".to_string(),
                prompt_tokens: Some(12),
                completion_tokens: Some(34),
                total_tokens: Some(46),
            },
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Provider that always fails
pub struct DownProvider(&'static str);

#[async_trait]
impl LlmProvider for DownProvider {
    async fn complete(&self, _request: &ChatRequest) -> Result<Completion, AiError> {
        Err(AiError::Api {
            provider: self.0.to_string(),
            status: 503,
            body: "unavailable".to_string(),
        })
    }

    fn name(&self) -> &str {
        self.0
    }
}

pub struct StockPhotos;

#[async_trait]
impl ImageSearch for StockPhotos {
    async fn search(&self, query: &str, per_page: u32) -> Result<ImageSearchPage, AiError> {
        let hits = (0..per_page.min(3))
            .map(|n| ImageHit {
                url: format!("https://images.test/{}.jpg", n),
                thumbnail: format!("https://images.test/{}-s.jpg", n),
                full_size: format!("https://images.test/{}-f.jpg", n),
                photographer: "Ana".to_string(),
                photographer_url: "https://unsplash.com/@ana".to_string(),
                description: Some(query.to_string()),
                unsplash_link: format!("https://unsplash.com/photos/{}", n),
                download_location: format!("https://api.unsplash.com/photos/{}/download", n),
            })
            .collect();
        Ok(ImageSearchPage { hits, total: 42 })
    }
}

pub struct EchoGenerator;

#[async_trait]
impl ImageGenerator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, AiError> {
        Ok(GeneratedImage {
            url: "https://images.test/generated.png".to_string(),
            revised_prompt: Some(prompt.to_string()),
        })
    }
}

fn scripted_agents(reply: &str) -> AgentService {
    let provider = Arc::new(ScriptedProvider {
        reply: reply.to_string(),
        requests: Mutex::new(Vec::new()),
    });
    AgentService::new(
        FallbackChain::new(provider, Arc::new(DownProvider("groq"))),
        Arc::new(StockPhotos),
        Arc::new(EchoGenerator),
    )
}

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub hub: ArticleHub,
}

impl TestApp {
    /// App whose language model answers every prompt with `reply`
    pub async fn with_reply(reply: &str) -> Self {
        Self::build(scripted_agents(reply)).await
    }

    /// App over an existing pool, e.g. a file-backed database
    pub async fn with_database(pool: SqlitePool) -> Self {
        Self::assemble(scripted_agents("Generated text"), pool)
    }

    /// App whose language providers are both down
    pub async fn with_providers_down() -> Self {
        let agents = AgentService::new(
            FallbackChain::new(Arc::new(DownProvider("openai")), Arc::new(DownProvider("groq"))),
            Arc::new(StockPhotos),
            Arc::new(EchoGenerator),
        );
        Self::build(agents).await
    }

    pub async fn new() -> Self {
        Self::with_reply("Generated text").await
    }

    async fn build(agents: AgentService) -> Self {
        let pool = newsdesk_common::db::init_memory_database()
            .await
            .expect("in-memory database");
        Self::assemble(agents, pool)
    }

    fn assemble(agents: AgentService, pool: SqlitePool) -> Self {
        let state = AppState::new(
            pool.clone(),
            agents,
            AuthSettings::new(TEST_SECRET, Duration::from_secs(3600)),
        );
        let hub = state.hub.clone();
        Self {
            router: build_router(state),
            pool,
            hub,
        }
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, Some(token), None)).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(request(Method::POST, uri, Some(token), Some(body))).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(request(Method::PATCH, uri, Some(token), Some(body))).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(request(Method::DELETE, uri, Some(token), None)).await
    }

    /// Register an account and return `(token, user_id)`
    pub async fn register(&self, email: &str, name: &str, role: &str) -> (String, String) {
        let (status, body) = self
            .send(request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": "secret123",
                    "name": name,
                    "role": role,
                })),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Create an article and return its id
    pub async fn create_article(&self, token: &str, title: &str, content: &str) -> String {
        let (status, body) = self
            .post(
                "/api/articles",
                token,
                json!({ "title": title, "content": content }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }
}

/// Build a request with an optional bearer token and JSON body
pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
