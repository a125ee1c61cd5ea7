//! Images attached to articles

use sqlx::{Row, SqlitePool};

use newsdesk_common::models::ArticleImage;
use newsdesk_common::{time, Result};

use super::{new_id, timestamp};

/// Image metadata to attach
#[derive(Debug, Clone, Default)]
pub struct NewImage {
    pub url: String,
    pub caption: Option<String>,
    pub alt_text: Option<String>,
    pub credit: Option<String>,
}

pub async fn add(pool: &SqlitePool, article_id: &str, image: &NewImage) -> Result<ArticleImage> {
    let id = new_id();
    let now = time::now();

    sqlx::query(
        r#"
        INSERT INTO images (id, article_id, url, caption, alt_text, credit, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(article_id)
    .bind(&image.url)
    .bind(image.caption.as_deref())
    .bind(image.alt_text.as_deref())
    .bind(image.credit.as_deref())
    .bind(time::to_db(&now))
    .execute(pool)
    .await?;

    Ok(ArticleImage {
        id,
        article_id: article_id.to_string(),
        url: image.url.clone(),
        caption: image.caption.clone(),
        alt_text: image.alt_text.clone(),
        credit: image.credit.clone(),
        created_at: time::from_db(&time::to_db(&now))?,
    })
}

/// Images in the order they were attached
pub async fn list_for_article(pool: &SqlitePool, article_id: &str) -> Result<Vec<ArticleImage>> {
    let rows = sqlx::query(
        r#"
        SELECT id, article_id, url, caption, alt_text, credit, created_at
        FROM images
        WHERE article_id = ?
        ORDER BY created_at ASC, rowid ASC
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(ArticleImage {
                id: row.try_get("id")?,
                article_id: row.try_get("article_id")?,
                url: row.try_get("url")?,
                caption: row.try_get("caption")?,
                alt_text: row.try_get("alt_text")?,
                credit: row.try_get("credit")?,
                created_at: timestamp(row, "created_at")?,
            })
        })
        .collect()
}
