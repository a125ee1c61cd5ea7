//! AI assistant routes against scripted providers
//!
//! - Responses keep the agent envelope and answer 200 even on failure
//! - Runs tied to an article are written to its agent log
//! - Successful fact checks store a verdict

mod helpers;

use axum::http::StatusCode;
use serde_json::{json, Value};

use helpers::TestApp;

const VERDICT: &str = r#"```json
{"verdict": "true", "explanation": "Matches port records", "confidence": 0.9, "sources": ["https://port.example.com"]}
```"#;

async fn agent_logs(app: &TestApp, token: &str, article_id: &str) -> Vec<Value> {
    let (_, detail) = app
        .get(&format!("/api/articles/{}", article_id), token)
        .await;
    detail["agentLogs"].as_array().unwrap().clone()
}

#[tokio::test]
async fn test_research_logs_run_against_article() {
    let app = TestApp::with_reply("Background: the harbor opened in 1902.").await;
    let (token, _) = app.register("w@news.test", "Wanda", "WRITER").await;
    let id = app.create_article(&token, "Harbor", "").await;

    let (status, body) = app
        .post(
            "/api/ai/research",
            &token,
            json!({ "topic": "harbor history", "keywords": ["port", "1902"], "articleId": id }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], "Background: the harbor opened in 1902.");
    assert_eq!(body["usage"]["provider"], "openai");

    let logs = agent_logs(&app, &token, &id).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["agentType"], "RESEARCH");
    assert_eq!(logs[0]["status"], "success");
    let input: Value = serde_json::from_str(logs[0]["input"].as_str().unwrap()).unwrap();
    assert_eq!(input, json!({ "topic": "harbor history", "keywords": ["port", "1902"] }));
    assert_eq!(logs[0]["metadata"]["total_tokens"], 46);
}

#[tokio::test]
async fn test_failed_run_answers_200_and_logs_error() {
    let app = TestApp::with_providers_down().await;
    let (token, _) = app.register("w@news.test", "Wanda", "WRITER").await;
    let id = app.create_article(&token, "Harbor", "").await;

    let (status, body) = app
        .post(
            "/api/ai/generate-article",
            &token,
            json!({ "brief": "Harbor fire recap", "articleId": id }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("fallback error"));
    assert!(body.get("data").is_none());

    let logs = agent_logs(&app, &token, &id).await;
    assert_eq!(logs[0]["agentType"], "WRITING");
    assert_eq!(logs[0]["status"], "error");
    assert!(logs[0]["output"].is_null());
    let input: Value = serde_json::from_str(logs[0]["input"].as_str().unwrap()).unwrap();
    assert_eq!(input, json!({ "brief": "Harbor fire recap", "style": "professional" }));
}

#[tokio::test]
async fn test_runs_without_article_are_not_logged() {
    let app = TestApp::new().await;
    let (token, _) = app.register("w@news.test", "Wanda", "WRITER").await;

    let (status, body) = app
        .post("/api/ai/research", &token, json!({ "topic": "tides" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agent_logs")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);

    let (status, _) = app
        .post(
            "/api/ai/research",
            &token,
            json!({ "topic": "tides", "articleId": "missing" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.post("/api/ai/research", &token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "topic");
}

#[tokio::test]
async fn test_fact_check_stores_verdict() {
    let app = TestApp::with_reply(VERDICT).await;
    let (token, _) = app.register("w@news.test", "Wanda", "WRITER").await;
    let id = app.create_article(&token, "Harbor", "").await;

    let (status, body) = app
        .post(
            "/api/ai/fact-check",
            &token,
            json!({ "claim": "The harbor opened in 1902", "context": "history", "articleId": id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let data: Value = serde_json::from_str(body["data"].as_str().unwrap()).unwrap();
    assert_eq!(data["verdict"], "true");

    let (_, detail) = app.get(&format!("/api/articles/{}", id), &token).await;
    let checks = detail["factChecks"].as_array().unwrap();
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0]["claim"], "The harbor opened in 1902");
    assert_eq!(checks[0]["verdict"], "true");
    assert_eq!(checks[0]["confidence"], 0.9);
    assert_eq!(checks[0]["sources"], json!(["https://port.example.com"]));
    assert_eq!(detail["agentLogs"][0]["agentType"], "FACT_CHECKING");
}

#[tokio::test]
async fn test_failed_fact_check_stores_nothing() {
    let app = TestApp::with_providers_down().await;
    let (token, _) = app.register("w@news.test", "Wanda", "WRITER").await;
    let id = app.create_article(&token, "Harbor", "").await;

    let (status, body) = app
        .post(
            "/api/ai/fact-check",
            &token,
            json!({ "claim": "The harbor opened in 1902", "articleId": id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);

    let (_, detail) = app.get(&format!("/api/articles/{}", id), &token).await;
    assert_eq!(detail["factChecks"], json!([]));
    assert_eq!(detail["agentLogs"], json!([]));
}

#[tokio::test]
async fn test_editorial_log_records_length_not_content() {
    let app = TestApp::with_reply("Tighten the lede.").await;
    let (token, _) = app.register("w@news.test", "Wanda", "WRITER").await;
    let id = app.create_article(&token, "Harbor", "").await;

    let (status, body) = app
        .post(
            "/api/ai/editorial-review",
            &token,
            json!({
                "content": "Twelve chars",
                "guidelines": { "tone": "neutral" },
                "articleId": id,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], "Tighten the lede.");

    let logs = agent_logs(&app, &token, &id).await;
    let input: Value = serde_json::from_str(logs[0]["input"].as_str().unwrap()).unwrap();
    assert_eq!(input["contentLength"], 12);
    assert_eq!(input["guidelines"]["tone"], "neutral");
    assert!(!logs[0]["input"].as_str().unwrap().contains("Twelve chars"));
}

#[tokio::test]
async fn test_image_routes() {
    let app = TestApp::with_reply("  Fireboats spray the burning pier.  ").await;
    let (token, _) = app.register("w@news.test", "Wanda", "WRITER").await;

    let (status, body) = app
        .post("/api/ai/search-images", &token, json!({ "query": "harbor" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["images"].as_array().unwrap().len(), 3);
    assert_eq!(body["total"], 42);

    let (_, body) = app
        .post(
            "/api/ai/generate-image",
            &token,
            json!({ "description": "A fire on the harbor pier at night" }),
        )
        .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["photographer"], "Ana");

    let (_, body) = app
        .post(
            "/api/ai/generate-image-dalle",
            &token,
            json!({ "description": "Harbor at dawn" }),
        )
        .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["url"], "https://images.test/generated.png");
    assert!(body["revisedPrompt"].as_str().unwrap().contains("photorealistic"));

    let (_, body) = app
        .post(
            "/api/ai/generate-caption",
            &token,
            json!({ "imageDescription": "fireboats", "articleContext": "harbor fire" }),
        )
        .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["caption"], "Fireboats spray the burning pier.");
}

#[tokio::test]
async fn test_assess_source_requires_url_and_content() {
    let app = TestApp::with_reply("Credibility: high").await;
    let (token, _) = app.register("w@news.test", "Wanda", "WRITER").await;

    let (status, body) = app
        .post("/api/ai/assess-source", &token, json!({ "sourceUrl": "https://example.com" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "sourceContent");

    let (status, body) = app
        .post(
            "/api/ai/assess-source",
            &token,
            json!({ "sourceUrl": "https://example.com", "sourceContent": "Official figures" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], "Credibility: high");
    assert!(body.get("usage").is_none());
}
