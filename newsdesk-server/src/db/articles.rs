//! Articles and their version history

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use newsdesk_common::models::{
    Article, ArticleCounts, ArticleDetail, ArticleListItem, ArticleStatus, ArticleVersion,
    AuthorSummary, UserSummary,
};
use newsdesk_common::{time, Result};

use super::{new_id, optional_timestamp, string_list, timestamp};
use crate::pagination::PageRequest;

/// Agent log entries embedded in an article detail
const DETAIL_AGENT_LOG_LIMIT: i64 = 10;

const SELECT_ARTICLE: &str = r#"
    SELECT a.id, a.title, a.content, a.summary, a.status, a.tags, a.featured_image,
           a.author_id, a.published_at, a.created_at, a.updated_at,
           u.name AS author_name, u.email AS author_email, u.avatar AS author_avatar,
           u.role AS author_role
    FROM articles a
    JOIN users u ON u.id = a.author_id
"#;

/// Case-folded title and content matched by listing searches
///
/// SQLite's `lower()` only folds ASCII, so folding happens here and the
/// result is stored alongside the article.
pub fn search_text(title: &str, content: &str) -> String {
    format!("{}\n{}", title, content).to_lowercase()
}

/// Listing filters; `None` matches everything
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub status: Option<ArticleStatus>,
    pub author_id: Option<String>,
    /// Case-insensitive substring of title or content
    pub search: Option<String>,
}

/// Field changes for [`update`]; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ArticleChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub status: Option<ArticleStatus>,
    pub tags: Option<Vec<String>>,
    pub featured_image: Option<String>,
}

fn map_article(row: &SqliteRow, with_author_role: bool) -> Result<Article> {
    let status: String = row.try_get("status")?;
    let author_role = if with_author_role {
        let role: String = row.try_get("author_role")?;
        Some(role.parse()?)
    } else {
        None
    };

    Ok(Article {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        summary: row.try_get("summary")?,
        status: status.parse()?,
        tags: string_list(row, "tags")?,
        featured_image: row.try_get("featured_image")?,
        author_id: row.try_get("author_id")?,
        published_at: optional_timestamp(row, "published_at")?,
        created_at: timestamp(row, "created_at")?,
        updated_at: timestamp(row, "updated_at")?,
        author: Some(AuthorSummary {
            id: row.try_get("author_id")?,
            name: row.try_get("author_name")?,
            email: row.try_get("author_email")?,
            avatar: row.try_get("author_avatar")?,
            role: author_role,
        }),
    })
}

/// Insert a new DRAFT article owned by `author_id`
pub async fn create(
    pool: &SqlitePool,
    author_id: &str,
    title: &str,
    content: &str,
    tags: &[String],
) -> Result<Article> {
    let id = new_id();
    let now = time::now_db();

    sqlx::query(
        r#"
        INSERT INTO articles (id, title, content, search_text, status, tags, author_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(title)
    .bind(content)
    .bind(search_text(title, content))
    .bind(ArticleStatus::Draft.as_str())
    .bind(serde_json::to_string(tags)?)
    .bind(author_id)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    find(pool, &id)
        .await?
        .ok_or_else(|| newsdesk_common::Error::Internal(format!("Article {} vanished after insert", id)))
}

/// Article with its author (without the author's role)
pub async fn find(pool: &SqlitePool, id: &str) -> Result<Option<Article>> {
    let row = sqlx::query(&format!("{} WHERE a.id = ?", SELECT_ARTICLE))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(|r| map_article(r, false)).transpose()
}

pub async fn exists(pool: &SqlitePool, id: &str) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM articles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Page of articles, most recently updated first, plus the total match count
pub async fn list(
    pool: &SqlitePool,
    filter: &ArticleFilter,
    page: PageRequest,
) -> Result<(Vec<ArticleListItem>, i64)> {
    const WHERE: &str = r#"
        WHERE (?1 IS NULL OR a.status = ?1)
          AND (?2 IS NULL OR a.author_id = ?2)
          AND (?3 IS NULL OR instr(a.search_text, ?3) > 0)
    "#;

    let status = filter.status.map(|s| s.as_str());
    let search = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM articles a {}", WHERE))
        .bind(status)
        .bind(filter.author_id.as_deref())
        .bind(search.as_deref())
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query(&format!(
        r#"
        {select}
        {filter}
        ORDER BY a.updated_at DESC, a.rowid DESC
        LIMIT ?4 OFFSET ?5
        "#,
        select = SELECT_ARTICLE.replace(
            "FROM articles a",
            ", (SELECT COUNT(*) FROM comments c WHERE c.article_id = a.id) AS comment_count, \
               (SELECT COUNT(*) FROM article_versions v WHERE v.article_id = a.id) AS version_count \
             FROM articles a",
        ),
        filter = WHERE,
    ))
    .bind(status)
    .bind(filter.author_id.as_deref())
    .bind(search.as_deref())
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let items = rows
        .iter()
        .map(|row| {
            Ok(ArticleListItem {
                article: map_article(row, false)?,
                counts: ArticleCounts {
                    comments: row.try_get("comment_count")?,
                    versions: row.try_get("version_count")?,
                },
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((items, total))
}

/// Apply `changes`, snapshotting the previous title and content first when
/// the content changes
///
/// The snapshot and the update commit together. `BEGIN IMMEDIATE` takes the
/// write lock before the reads, so concurrent editors wait on the busy
/// timeout. Returns `None` when the article does not exist.
pub async fn update(
    pool: &SqlitePool,
    id: &str,
    changes: &ArticleChanges,
    editor_id: &str,
) -> Result<Option<Article>> {
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    let current = sqlx::query("SELECT title, content FROM articles WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

    let Some(current) = current else {
        return Ok(None);
    };

    let previous_title: String = current.try_get("title")?;
    let previous_content: String = current.try_get("content")?;
    let now = time::now_db();

    if let Some(content) = &changes.content {
        if *content != previous_content {
            let version_count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM article_versions WHERE article_id = ?")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;

            sqlx::query(
                r#"
                INSERT INTO article_versions (id, article_id, user_id, title, content, version_number, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(new_id())
            .bind(id)
            .bind(editor_id)
            .bind(&previous_title)
            .bind(&previous_content)
            .bind(version_count + 1)
            .bind(&now)
            .execute(&mut *tx)
            .await?;

            debug!(article_id = %id, version = version_count + 1, "Stored article version");
        }
    }

    let tags = changes.tags.as_ref().map(serde_json::to_string).transpose()?;
    let search = search_text(
        changes.title.as_deref().unwrap_or(&previous_title),
        changes.content.as_deref().unwrap_or(&previous_content),
    );

    sqlx::query(
        r#"
        UPDATE articles
        SET title = COALESCE(?, title),
            content = COALESCE(?, content),
            search_text = ?,
            summary = COALESCE(?, summary),
            status = COALESCE(?, status),
            tags = COALESCE(?, tags),
            featured_image = COALESCE(?, featured_image),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(changes.title.as_deref())
    .bind(changes.content.as_deref())
    .bind(&search)
    .bind(changes.summary.as_deref())
    .bind(changes.status.map(|s| s.as_str()))
    .bind(tags)
    .bind(changes.featured_image.as_deref())
    .bind(&now)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find(pool, id).await
}

/// Move an article to `status`; returns `None` when it does not exist
pub async fn set_status(
    pool: &SqlitePool,
    id: &str,
    status: ArticleStatus,
) -> Result<Option<Article>> {
    let result = sqlx::query("UPDATE articles SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(time::now_db())
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find(pool, id).await
}

/// Mark an article PUBLISHED with `published_at = now`
pub async fn publish(pool: &SqlitePool, id: &str) -> Result<Option<Article>> {
    let now = time::now_db();
    let result = sqlx::query(
        "UPDATE articles SET status = ?, published_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(ArticleStatus::Published.as_str())
    .bind(&now)
    .bind(&now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find(pool, id).await
}

/// Delete an article and, by cascade, everything attached to it
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Version history, newest first
pub async fn versions(pool: &SqlitePool, article_id: &str) -> Result<Vec<ArticleVersion>> {
    let rows = sqlx::query(
        r#"
        SELECT v.id, v.article_id, v.user_id, v.title, v.content, v.version_number, v.created_at,
               u.name AS user_name, u.avatar AS user_avatar
        FROM article_versions v
        JOIN users u ON u.id = v.user_id
        WHERE v.article_id = ?
        ORDER BY v.version_number DESC
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(ArticleVersion {
                id: row.try_get("id")?,
                article_id: row.try_get("article_id")?,
                user_id: row.try_get("user_id")?,
                title: row.try_get("title")?,
                content: row.try_get("content")?,
                version_number: row.try_get("version_number")?,
                created_at: timestamp(row, "created_at")?,
                user: Some(UserSummary {
                    id: row.try_get("user_id")?,
                    name: row.try_get("user_name")?,
                    avatar: row.try_get("user_avatar")?,
                }),
            })
        })
        .collect()
}

/// Article with every related collection
pub async fn detail(pool: &SqlitePool, id: &str) -> Result<Option<ArticleDetail>> {
    let row = sqlx::query(&format!("{} WHERE a.id = ?", SELECT_ARTICLE))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let article = map_article(&row, true)?;

    Ok(Some(ArticleDetail {
        sources: super::sources::list_for_article(pool, id, false).await?,
        citations: super::sources::citations_for_article(pool, id).await?,
        images: super::images::list_for_article(pool, id).await?,
        comments: super::comments::threads_for_article(pool, id).await?,
        fact_checks: super::agent_logs::fact_checks_for_article(pool, id).await?,
        agent_logs: super::agent_logs::recent_for_article(pool, id, DETAIL_AGENT_LOG_LIMIT).await?,
        article,
    }))
}
