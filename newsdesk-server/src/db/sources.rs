//! Research sources and the citations that quote them

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

use newsdesk_common::models::{Citation, Source};
use newsdesk_common::{time, Result};

use super::{new_id, optional_timestamp, timestamp};

/// Source to record against an article
#[derive(Debug, Clone)]
pub struct NewSource {
    pub url: String,
    pub title: String,
    pub publisher: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
}

/// Citation to record; the source must belong to the same article
#[derive(Debug, Clone)]
pub struct NewCitation {
    pub source_id: String,
    pub quote: String,
    pub context: Option<String>,
    pub position: Option<i64>,
}

const SELECT_SOURCE: &str = r#"
    SELECT id, article_id, url, title, publisher, published_at, summary,
           credibility_score, created_at
    FROM sources
"#;

const SELECT_CITATION: &str = r#"
    SELECT id, article_id, source_id, quote, context, position, created_at
    FROM citations
"#;

fn map_source(row: &SqliteRow) -> Result<Source> {
    Ok(Source {
        id: row.try_get("id")?,
        article_id: row.try_get("article_id")?,
        url: row.try_get("url")?,
        title: row.try_get("title")?,
        publisher: row.try_get("publisher")?,
        published_at: optional_timestamp(row, "published_at")?,
        summary: row.try_get("summary")?,
        credibility_score: row.try_get("credibility_score")?,
        created_at: timestamp(row, "created_at")?,
        citations: None,
    })
}

fn map_citation(row: &SqliteRow) -> Result<Citation> {
    Ok(Citation {
        id: row.try_get("id")?,
        article_id: row.try_get("article_id")?,
        source_id: row.try_get("source_id")?,
        quote: row.try_get("quote")?,
        context: row.try_get("context")?,
        position: row.try_get("position")?,
        created_at: timestamp(row, "created_at")?,
        source: None,
    })
}

pub async fn create(pool: &SqlitePool, article_id: &str, source: &NewSource) -> Result<Source> {
    let id = new_id();

    sqlx::query(
        r#"
        INSERT INTO sources (id, article_id, url, title, publisher, published_at, summary, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(article_id)
    .bind(&source.url)
    .bind(&source.title)
    .bind(source.publisher.as_deref())
    .bind(source.published_at.as_ref().map(time::to_db))
    .bind(source.summary.as_deref())
    .bind(time::now_db())
    .execute(pool)
    .await?;

    find(pool, &id)
        .await?
        .ok_or_else(|| newsdesk_common::Error::Internal(format!("Source {} vanished after insert", id)))
}

pub async fn find(pool: &SqlitePool, id: &str) -> Result<Option<Source>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_SOURCE))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(map_source).transpose()
}

/// Sources of an article, newest first
///
/// With `with_citations`, each source carries its citations newest first.
pub async fn list_for_article(
    pool: &SqlitePool,
    article_id: &str,
    with_citations: bool,
) -> Result<Vec<Source>> {
    let rows = sqlx::query(&format!(
        "{} WHERE article_id = ? ORDER BY created_at DESC, rowid DESC",
        SELECT_SOURCE
    ))
    .bind(article_id)
    .fetch_all(pool)
    .await?;

    let mut sources = rows.iter().map(map_source).collect::<Result<Vec<_>>>()?;
    if !with_citations {
        return Ok(sources);
    }

    let rows = sqlx::query(&format!(
        "{} WHERE article_id = ? ORDER BY created_at DESC, rowid DESC",
        SELECT_CITATION
    ))
    .bind(article_id)
    .fetch_all(pool)
    .await?;

    let mut by_source: HashMap<String, Vec<Citation>> = HashMap::new();
    for row in &rows {
        let citation = map_citation(row)?;
        by_source
            .entry(citation.source_id.clone())
            .or_default()
            .push(citation);
    }

    for source in &mut sources {
        source.citations = Some(by_source.remove(&source.id).unwrap_or_default());
    }
    Ok(sources)
}

/// Citations of an article in position order, each with its source
pub async fn citations_for_article(pool: &SqlitePool, article_id: &str) -> Result<Vec<Citation>> {
    let sources: HashMap<String, Source> = list_for_article(pool, article_id, false)
        .await?
        .into_iter()
        .map(|source| (source.id.clone(), source))
        .collect();

    let rows = sqlx::query(&format!(
        "{} WHERE article_id = ? ORDER BY position IS NULL, position ASC, created_at ASC, rowid ASC",
        SELECT_CITATION
    ))
    .bind(article_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let mut citation = map_citation(row)?;
            citation.source = sources.get(&citation.source_id).cloned();
            Ok(citation)
        })
        .collect()
}

/// Set the credibility score and/or summary; returns `None` when missing
pub async fn update(
    pool: &SqlitePool,
    id: &str,
    credibility_score: Option<f64>,
    summary: Option<&str>,
) -> Result<Option<Source>> {
    let result = sqlx::query(
        r#"
        UPDATE sources
        SET credibility_score = COALESCE(?, credibility_score),
            summary = COALESCE(?, summary)
        WHERE id = ?
        "#,
    )
    .bind(credibility_score)
    .bind(summary)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find(pool, id).await
}

/// Delete a source and the citations quoting it
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sources WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Record a citation, returning it with its source embedded
///
/// Returns `None` when the source does not belong to `article_id`.
pub async fn create_citation(
    pool: &SqlitePool,
    article_id: &str,
    citation: &NewCitation,
) -> Result<Option<Citation>> {
    let source = match find(pool, &citation.source_id).await? {
        Some(source) if source.article_id == article_id => source,
        _ => return Ok(None),
    };

    let id = new_id();
    let now = time::now_db();

    sqlx::query(
        r#"
        INSERT INTO citations (id, article_id, source_id, quote, context, position, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(article_id)
    .bind(&citation.source_id)
    .bind(&citation.quote)
    .bind(citation.context.as_deref())
    .bind(citation.position)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(Some(Citation {
        id,
        article_id: article_id.to_string(),
        source_id: citation.source_id.clone(),
        quote: citation.quote.clone(),
        context: citation.context.clone(),
        position: citation.position,
        created_at: time::from_db(&now)?,
        source: Some(source),
    }))
}
