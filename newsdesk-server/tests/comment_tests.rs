//! Comment threads and the notifications they produce

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use helpers::TestApp;
use newsdesk_common::ArticleEvent;

#[tokio::test]
async fn test_comment_notifies_author_and_broadcasts() {
    let app = TestApp::new().await;
    let (author, author_id) = app.register("a@news.test", "Author", "WRITER").await;
    let (editor, editor_id) = app.register("e@news.test", "Eve", "EDITOR").await;
    let id = app.create_article(&author, "Story", "Text").await;
    let mut session = app.hub.subscribe(&id, &author_id);

    let (status, comment) = app
        .post(
            "/api/comments",
            &editor,
            json!({ "articleId": id, "content": "  Check the second quote  " }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["content"], "Check the second quote");
    assert_eq!(comment["resolved"], false);
    assert_eq!(comment["user"]["id"], editor_id.as_str());

    match session.recv().await {
        Some(ArticleEvent::CommentAdded { comment: pushed }) => {
            assert_eq!(pushed.id, comment["id"].as_str().unwrap());
        }
        other => panic!("expected comment-added, got {:?}", other),
    }

    let (_, notes) = app.get("/api/notifications", &author).await;
    let notes = notes.as_array().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["type"], "comment");
    assert_eq!(notes[0]["title"], "New Comment");
    assert_eq!(notes[0]["message"], "Eve commented on your article");
}

#[tokio::test]
async fn test_author_commenting_on_own_article_is_not_notified() {
    let app = TestApp::new().await;
    let (author, _) = app.register("a@news.test", "Author", "WRITER").await;
    let id = app.create_article(&author, "Story", "Text").await;

    let (status, _) = app
        .post("/api/comments", &author, json!({ "articleId": id, "content": "Note to self" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, notes) = app.get("/api/notifications", &author).await;
    assert!(notes.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_comment_validation_and_parent_checks() {
    let app = TestApp::new().await;
    let (author, _) = app.register("a@news.test", "Author", "WRITER").await;
    let first = app.create_article(&author, "First", "Text").await;
    let second = app.create_article(&author, "Second", "Text").await;

    let (status, body) = app
        .post("/api/comments", &author, json!({ "articleId": first, "content": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "content");

    let (status, body) = app
        .post("/api/comments", &author, json!({ "articleId": "missing", "content": "Hi" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Article not found");

    let (_, parent) = app
        .post("/api/comments", &author, json!({ "articleId": first, "content": "Parent" }))
        .await;
    let (status, _) = app
        .post(
            "/api/comments",
            &author,
            json!({ "articleId": second, "content": "Wrong thread", "parentId": parent["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_threads_list_newest_first_with_replies_oldest_first() {
    let app = TestApp::new().await;
    let (author, _) = app.register("a@news.test", "Author", "WRITER").await;
    let (editor, _) = app.register("e@news.test", "Eve", "EDITOR").await;
    let id = app.create_article(&author, "Story", "Text").await;

    let (_, older) = app
        .post("/api/comments", &editor, json!({ "articleId": id, "content": "Older" }))
        .await;
    app.post("/api/comments", &editor, json!({ "articleId": id, "content": "Newer" }))
        .await;
    for reply in ["Reply one", "Reply two"] {
        app.post(
            "/api/comments",
            &author,
            json!({ "articleId": id, "content": reply, "parentId": older["id"] }),
        )
        .await;
    }

    let (status, threads) = app
        .get(&format!("/api/comments/article/{}", id), &author)
        .await;
    assert_eq!(status, StatusCode::OK);
    let threads = threads.as_array().unwrap();
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0]["content"], "Newer");
    assert_eq!(threads[0]["replies"], json!([]));
    assert_eq!(threads[1]["content"], "Older");
    assert_eq!(threads[1]["replies"][0]["content"], "Reply one");
    assert_eq!(threads[1]["replies"][1]["content"], "Reply two");
}

#[tokio::test]
async fn test_nested_replies_are_listed() {
    let app = TestApp::new().await;
    let (author, _) = app.register("a@news.test", "Author", "WRITER").await;
    let id = app.create_article(&author, "Story", "Text").await;

    let (_, top) = app
        .post("/api/comments", &author, json!({ "articleId": id, "content": "Top" }))
        .await;
    let (_, first) = app
        .post(
            "/api/comments",
            &author,
            json!({ "articleId": id, "content": "First reply", "parentId": top["id"] }),
        )
        .await;
    let (status, _) = app
        .post(
            "/api/comments",
            &author,
            json!({ "articleId": id, "content": "Reply to reply", "parentId": first["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, threads) = app
        .get(&format!("/api/comments/article/{}", id), &author)
        .await;
    assert_eq!(threads.as_array().unwrap().len(), 1);
    let reply = &threads[0]["replies"][0];
    assert_eq!(reply["content"], "First reply");
    assert_eq!(reply["replies"][0]["content"], "Reply to reply");
    assert_eq!(reply["replies"][0]["replies"], json!([]));

    let (_, detail) = app.get(&format!("/api/articles/{}", id), &author).await;
    assert_eq!(detail["comments"][0]["replies"][0]["replies"][0]["content"], "Reply to reply");
}

#[tokio::test]
async fn test_only_owner_edits_and_owner_or_admin_deletes() {
    let app = TestApp::new().await;
    let (author, _) = app.register("a@news.test", "Author", "WRITER").await;
    let (editor, _) = app.register("e@news.test", "Eve", "EDITOR").await;
    let (admin, _) = app.register("admin@news.test", "Ada", "ADMIN").await;
    let id = app.create_article(&author, "Story", "Text").await;

    let (_, comment) = app
        .post("/api/comments", &editor, json!({ "articleId": id, "content": "Typo in lede" }))
        .await;
    let uri = format!("/api/comments/{}", comment["id"].as_str().unwrap());

    let (status, _) = app.patch(&uri, &author, json!({ "resolved": true })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .patch(&uri, &editor, json!({ "content": " ", "resolved": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Typo in lede");
    assert_eq!(body["resolved"], true);

    let (status, _) = app.delete(&uri, &author).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.delete(&uri, &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Comment deleted successfully");

    let (status, body) = app.delete(&uri, &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Comment not found");
}

#[tokio::test]
async fn test_notifications_are_scoped_to_their_owner() {
    let app = TestApp::new().await;
    let (author, _) = app.register("a@news.test", "Author", "WRITER").await;
    let (editor, _) = app.register("e@news.test", "Eve", "EDITOR").await;
    let id = app.create_article(&author, "Story", "Text").await;

    for n in 0..3 {
        app.post(
            "/api/comments",
            &editor,
            json!({ "articleId": id, "content": format!("Comment {}", n) }),
        )
        .await;
    }

    let (_, notes) = app.get("/api/notifications?limit=2", &author).await;
    assert_eq!(notes.as_array().unwrap().len(), 2);

    let (_, notes) = app.get("/api/notifications", &author).await;
    let note_id = notes[0]["id"].as_str().unwrap().to_string();

    // Another user's notification behaves as missing
    let (status, _) = app
        .patch(&format!("/api/notifications/{}/read", note_id), &editor, json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .delete(&format!("/api/notifications/{}", note_id), &editor)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .patch(&format!("/api/notifications/{}/read", note_id), &author, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["read"], true);

    let (_, unread) = app.get("/api/notifications?unreadOnly=true", &author).await;
    assert_eq!(unread.as_array().unwrap().len(), 2);

    let (status, body) = app
        .post("/api/notifications/read-all", &author, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "All notifications marked as read");

    let (_, unread) = app.get("/api/notifications?unreadOnly=true", &author).await;
    assert!(unread.as_array().unwrap().is_empty());

    let (status, body) = app
        .delete(&format!("/api/notifications/{}", note_id), &author)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Notification deleted");

    let (_, remaining) = app.get("/api/notifications", &author).await;
    assert_eq!(remaining.as_array().unwrap().len(), 2);
}
