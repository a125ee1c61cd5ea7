//! Comment threads

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

use newsdesk_common::models::{Comment, UserSummary};
use newsdesk_common::{time, Result};

use super::{new_id, timestamp};

const SELECT_COMMENT: &str = r#"
    SELECT c.id, c.article_id, c.user_id, c.parent_id, c.content, c.resolved,
           c.created_at, c.updated_at,
           u.name AS user_name, u.avatar AS user_avatar
    FROM comments c
    JOIN users u ON u.id = c.user_id
"#;

fn map_comment(row: &SqliteRow) -> Result<Comment> {
    let resolved: i64 = row.try_get("resolved")?;
    Ok(Comment {
        id: row.try_get("id")?,
        article_id: row.try_get("article_id")?,
        user_id: row.try_get("user_id")?,
        parent_id: row.try_get("parent_id")?,
        content: row.try_get("content")?,
        resolved: resolved != 0,
        created_at: timestamp(row, "created_at")?,
        updated_at: timestamp(row, "updated_at")?,
        user: Some(UserSummary {
            id: row.try_get("user_id")?,
            name: row.try_get("user_name")?,
            avatar: row.try_get("user_avatar")?,
        }),
        replies: None,
    })
}

pub async fn create(
    pool: &SqlitePool,
    article_id: &str,
    user_id: &str,
    content: &str,
    parent_id: Option<&str>,
) -> Result<Comment> {
    let id = new_id();
    let now = time::now_db();

    sqlx::query(
        r#"
        INSERT INTO comments (id, article_id, user_id, parent_id, content, resolved, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(article_id)
    .bind(user_id)
    .bind(parent_id)
    .bind(content)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    find(pool, &id)
        .await?
        .ok_or_else(|| newsdesk_common::Error::Internal(format!("Comment {} vanished after insert", id)))
}

pub async fn find(pool: &SqlitePool, id: &str) -> Result<Option<Comment>> {
    let row = sqlx::query(&format!("{} WHERE c.id = ?", SELECT_COMMENT))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(map_comment).transpose()
}

/// Article the comment belongs to, if the comment exists
pub async fn article_of(pool: &SqlitePool, id: &str) -> Result<Option<String>> {
    let article_id = sqlx::query_scalar("SELECT article_id FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(article_id)
}

/// Top-level comments newest first, each carrying its reply tree
///
/// Replies at every depth are listed oldest first.
pub async fn threads_for_article(pool: &SqlitePool, article_id: &str) -> Result<Vec<Comment>> {
    let rows = sqlx::query(&format!(
        "{} WHERE c.article_id = ? ORDER BY c.created_at ASC, c.rowid ASC",
        SELECT_COMMENT
    ))
    .bind(article_id)
    .fetch_all(pool)
    .await?;

    let mut top_level = Vec::new();
    let mut replies: HashMap<String, Vec<Comment>> = HashMap::new();

    for row in &rows {
        let comment = map_comment(row)?;
        match &comment.parent_id {
            Some(parent) => replies.entry(parent.clone()).or_default().push(comment),
            None => top_level.push(comment),
        }
    }

    top_level.reverse();
    for comment in &mut top_level {
        attach_replies(comment, &mut replies);
    }

    Ok(top_level)
}

fn attach_replies(comment: &mut Comment, replies: &mut HashMap<String, Vec<Comment>>) {
    let mut children = replies.remove(&comment.id).unwrap_or_default();
    for child in &mut children {
        attach_replies(child, replies);
    }
    comment.replies = Some(children);
}

/// Apply content and/or resolved flag; returns `None` when missing
pub async fn update(
    pool: &SqlitePool,
    id: &str,
    content: Option<&str>,
    resolved: Option<bool>,
) -> Result<Option<Comment>> {
    let result = sqlx::query(
        r#"
        UPDATE comments
        SET content = COALESCE(?, content),
            resolved = COALESCE(?, resolved),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(content)
    .bind(resolved.map(i64::from))
    .bind(time::now_db())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find(pool, id).await
}

/// Delete a comment and its replies
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
