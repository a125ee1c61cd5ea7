//! User accounts

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use newsdesk_common::models::{Role, UserProfile};
use newsdesk_common::{time, Result};

use super::{new_id, timestamp};

/// Stored user, including the password hash
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    /// `None` for accounts created through an external identity provider
    pub password_hash: Option<String>,
    pub name: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            avatar: self.avatar.clone(),
            created_at: self.created_at,
        }
    }
}

/// Activity counters for the profile page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub articles_count: i64,
    pub comments_count: i64,
    pub published_count: i64,
}

const SELECT_USER: &str =
    "SELECT id, email, password_hash, name, role, avatar, created_at FROM users";

fn map_user(row: &SqliteRow) -> Result<UserRecord> {
    let role: String = row.try_get("role")?;
    Ok(UserRecord {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        name: row.try_get("name")?,
        role: role.parse()?,
        avatar: row.try_get("avatar")?,
        created_at: timestamp(row, "created_at")?,
    })
}

/// Insert a local (email/password) account
pub async fn create(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    name: &str,
    role: Role,
) -> Result<UserRecord> {
    let id = new_id();
    let now = time::now_db();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, name, role, provider, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, 'local', ?, ?)
        "#,
    )
    .bind(&id)
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(role.as_str())
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(UserRecord {
        id,
        email: email.to_string(),
        password_hash: Some(password_hash.to_string()),
        name: name.to_string(),
        role,
        avatar: None,
        created_at: time::from_db(&now)?,
    })
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<UserRecord>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_USER))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(map_user).transpose()
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<UserRecord>> {
    let row = sqlx::query(&format!("{} WHERE email = ?", SELECT_USER))
        .bind(email)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(map_user).transpose()
}

/// Apply the given profile fields, leaving `None` fields untouched
pub async fn update_profile(
    pool: &SqlitePool,
    id: &str,
    name: Option<&str>,
    avatar: Option<&str>,
) -> Result<Option<UserRecord>> {
    sqlx::query(
        r#"
        UPDATE users
        SET name = COALESCE(?, name),
            avatar = COALESCE(?, avatar),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(avatar)
    .bind(time::now_db())
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id).await
}

/// Ids of every user holding `role`
pub async fn ids_with_role(pool: &SqlitePool, role: Role) -> Result<Vec<String>> {
    let ids = sqlx::query_scalar("SELECT id FROM users WHERE role = ? ORDER BY created_at")
        .bind(role.as_str())
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

pub async fn stats(pool: &SqlitePool, id: &str) -> Result<UserStats> {
    let row = sqlx::query(
        r#"
        SELECT
            (SELECT COUNT(*) FROM articles WHERE author_id = ?1) AS articles_count,
            (SELECT COUNT(*) FROM comments WHERE user_id = ?1) AS comments_count,
            (SELECT COUNT(*) FROM articles WHERE author_id = ?1 AND status = 'PUBLISHED') AS published_count
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(UserStats {
        articles_count: row.try_get("articles_count")?,
        comments_count: row.try_get("comments_count")?,
        published_count: row.try_get("published_count")?,
    })
}
