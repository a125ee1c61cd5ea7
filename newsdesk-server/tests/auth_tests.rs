//! Registration, login, token guard and profile endpoints

mod helpers;

use axum::http::{Method, StatusCode};
use serde_json::json;

use helpers::{request, TestApp};

#[tokio::test]
async fn test_register_returns_token_and_profile() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": "  Reporter@News.Test ",
                "password": "secret123",
                "name": " Rita Reporter ",
            })),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["email"], "reporter@news.test");
    assert_eq!(body["user"]["name"], "Rita Reporter");
    assert_eq!(body["user"]["role"], "WRITER");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = TestApp::new().await;
    app.register("dup@news.test", "First", "WRITER").await;

    let (status, body) = app
        .send(request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "DUP@news.test", "password": "secret123", "name": "Second" })),
        ))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_registrations_conflict_with_specific_message() {
    use tower::util::ServiceExt;

    let dir = tempfile::tempdir().unwrap();
    let pool = newsdesk_common::db::init_database(&dir.path().join("newsdesk.db"))
        .await
        .unwrap();
    let app = TestApp::with_database(pool).await;

    let mut attempts = tokio::task::JoinSet::new();
    for n in 0..6 {
        let router = app.router.clone();
        let register = request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "race@news.test", "password": "secret123", "name": format!("Racer {}", n) })),
        );
        attempts.spawn(async move { router.oneshot(register).await.unwrap() });
    }

    let mut created = 0;
    while let Some(response) = attempts.join_next().await {
        let response = response.unwrap();
        match response.status() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => {
                let bytes = http_body_util::BodyExt::collect(response.into_body())
                    .await
                    .unwrap()
                    .to_bytes();
                let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
                assert_eq!(body["error"], "Email already registered");
            }
            other => panic!("unexpected status {}", other),
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test]
async fn test_register_reports_every_invalid_field() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "not-an-email", "password": "123", "name": "  ", "role": "OWNER" })),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password", "name", "role"]);
}

#[tokio::test]
async fn test_login_accepts_correct_password_only() {
    let app = TestApp::new().await;
    let (_, user_id) = app.register("editor@news.test", "Ed", "EDITOR").await;

    let (status, body) = app
        .send(request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "Editor@News.Test", "password": "secret123" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id.as_str());
    assert_eq!(body["user"]["role"], "EDITOR");

    let (status, body) = app
        .send(request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "editor@news.test", "password": "wrong-password" })),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = app
        .send(request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@news.test", "password": "secret123" })),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_protected_routes_require_valid_token() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(request(Method::GET, "/api/users/me", None, None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or missing authentication token");

    let (status, _) = app.get("/api/users/me", "not.a.jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/articles", "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_deleted_user_is_rejected() {
    let app = TestApp::new().await;
    let (token, user_id) = app.register("gone@news.test", "Gone", "WRITER").await;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&user_id)
        .execute(&app.pool)
        .await
        .unwrap();

    let (status, _) = app.get("/api/users/me", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_update_ignores_blank_values() {
    let app = TestApp::new().await;
    let (token, _) = app.register("me@news.test", "Original Name", "WRITER").await;

    let (status, body) = app
        .patch(
            "/api/users/me",
            &token,
            json!({ "name": "   ", "avatar": "https://cdn.test/me.png" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Original Name");
    assert_eq!(body["avatar"], "https://cdn.test/me.png");

    let (_, body) = app.get("/api/users/me", &token).await;
    assert_eq!(body["email"], "me@news.test");
    assert_eq!(body["avatar"], "https://cdn.test/me.png");
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn test_stats_count_articles_comments_and_published() {
    let app = TestApp::new().await;
    let (writer, _) = app.register("w@news.test", "Writer", "WRITER").await;
    let (editor, _) = app.register("e@news.test", "Editor", "EDITOR").await;

    let first = app.create_article(&writer, "First", "Body").await;
    app.create_article(&writer, "Second", "Body").await;
    app.post(&format!("/api/articles/{}/publish", first), &editor, json!({}))
        .await;
    app.post(
        "/api/comments",
        &writer,
        json!({ "articleId": first, "content": "Self note" }),
    )
    .await;

    let (status, body) = app.get("/api/users/me/stats", &writer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "articlesCount": 2, "commentsCount": 1, "publishedCount": 1 }));
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;

    let (status, body) = app.send(request(Method::GET, "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["liveArticles"], 0);
    assert!(body["version"].is_string());
    assert!(body["timestamp"].is_string());
}
