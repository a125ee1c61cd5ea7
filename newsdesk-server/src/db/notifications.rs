//! Per-user notifications
//!
//! Every lookup and mutation is scoped to the owning user; another user's
//! notification behaves as if it did not exist.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use newsdesk_common::models::{Notification, NotificationKind};
use newsdesk_common::{time, Result};

use super::{new_id, timestamp};

/// New notification to deliver
#[derive(Debug, Clone)]
pub struct NewNotification<'a> {
    pub kind: NotificationKind,
    pub title: &'a str,
    pub message: &'a str,
    pub link: Option<&'a str>,
}

fn map_notification(row: &SqliteRow) -> Result<Notification> {
    let kind: String = row.try_get("kind")?;
    let is_read: i64 = row.try_get("is_read")?;
    Ok(Notification {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        kind: kind.parse()?,
        title: row.try_get("title")?,
        message: row.try_get("message")?,
        link: row.try_get("link")?,
        read: is_read != 0,
        created_at: timestamp(row, "created_at")?,
    })
}

pub async fn create(
    pool: &SqlitePool,
    user_id: &str,
    notification: &NewNotification<'_>,
) -> Result<String> {
    let id = new_id();

    sqlx::query(
        r#"
        INSERT INTO notifications (id, user_id, kind, title, message, link, is_read, created_at)
        VALUES (?, ?, ?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(notification.kind.as_str())
    .bind(notification.title)
    .bind(notification.message)
    .bind(notification.link)
    .bind(time::now_db())
    .execute(pool)
    .await?;

    Ok(id)
}

/// Deliver the same notification to each of `user_ids` in one transaction
pub async fn create_many(
    pool: &SqlitePool,
    user_ids: &[String],
    notification: &NewNotification<'_>,
) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let now = time::now_db();

    for user_id in user_ids {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, kind, title, message, link, is_read, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(new_id())
        .bind(user_id)
        .bind(notification.kind.as_str())
        .bind(notification.title)
        .bind(notification.message)
        .bind(notification.link)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(user_ids.len())
}

/// The user's notifications, newest first
pub async fn list(
    pool: &SqlitePool,
    user_id: &str,
    unread_only: bool,
    limit: i64,
) -> Result<Vec<Notification>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, kind, title, message, link, is_read, created_at
        FROM notifications
        WHERE user_id = ? AND (? = 0 OR is_read = 0)
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(unread_only)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_notification).collect()
}

pub async fn mark_read(pool: &SqlitePool, id: &str, user_id: &str) -> Result<Option<Notification>> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let row = sqlx::query(
        "SELECT id, user_id, kind, title, message, link, is_read, created_at FROM notifications WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(map_notification).transpose()
}

/// Mark every unread notification of the user read; returns how many changed
pub async fn mark_all_read(pool: &SqlitePool, user_id: &str) -> Result<u64> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete(pool: &SqlitePool, id: &str, user_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
