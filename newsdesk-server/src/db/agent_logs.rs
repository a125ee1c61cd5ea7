//! AI run audit trail and stored fact checks

use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use newsdesk_common::models::{AgentLog, AgentType, FactCheck};
use newsdesk_common::{time, Result};

use super::{new_id, string_list, timestamp};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// One AI run to record against an article
#[derive(Debug, Clone)]
pub struct NewAgentLog<'a> {
    pub article_id: &'a str,
    pub agent_type: AgentType,
    /// Request parameters, stored as JSON text
    pub input: Value,
    pub output: Option<String>,
    pub succeeded: bool,
    pub error_message: Option<String>,
    pub metadata: Option<Value>,
}

/// Fact-check verdict to store against an article
#[derive(Debug, Clone)]
pub struct NewFactCheck<'a> {
    pub article_id: &'a str,
    pub claim: &'a str,
    pub verdict: &'a str,
    pub explanation: &'a str,
    pub confidence: f64,
    pub sources: &'a [String],
}

fn map_agent_log(row: &SqliteRow) -> Result<AgentLog> {
    let agent_type: String = row.try_get("agent_type")?;
    let metadata: Option<String> = row.try_get("metadata")?;
    Ok(AgentLog {
        id: row.try_get("id")?,
        article_id: row.try_get("article_id")?,
        agent_type: agent_type.parse()?,
        input: row.try_get("input")?,
        output: row.try_get("output")?,
        status: row.try_get("status")?,
        error_message: row.try_get("error_message")?,
        metadata: metadata.as_deref().map(serde_json::from_str).transpose()?,
        created_at: timestamp(row, "created_at")?,
    })
}

pub async fn record(pool: &SqlitePool, log: &NewAgentLog<'_>) -> Result<String> {
    let id = new_id();
    let status = if log.succeeded { STATUS_SUCCESS } else { STATUS_ERROR };
    let metadata = log.metadata.as_ref().map(serde_json::to_string).transpose()?;

    sqlx::query(
        r#"
        INSERT INTO agent_logs (id, article_id, agent_type, input, output, status, error_message, metadata, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(log.article_id)
    .bind(log.agent_type.as_str())
    .bind(serde_json::to_string(&log.input)?)
    .bind(log.output.as_deref())
    .bind(status)
    .bind(log.error_message.as_deref())
    .bind(metadata)
    .bind(time::now_db())
    .execute(pool)
    .await?;

    Ok(id)
}

/// Latest `limit` runs on an article, newest first
pub async fn recent_for_article(
    pool: &SqlitePool,
    article_id: &str,
    limit: i64,
) -> Result<Vec<AgentLog>> {
    let rows = sqlx::query(
        r#"
        SELECT id, article_id, agent_type, input, output, status, error_message, metadata, created_at
        FROM agent_logs
        WHERE article_id = ?
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(article_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_agent_log).collect()
}

pub async fn record_fact_check(pool: &SqlitePool, check: &NewFactCheck<'_>) -> Result<String> {
    let id = new_id();

    sqlx::query(
        r#"
        INSERT INTO fact_checks (id, article_id, claim, verdict, explanation, confidence, sources, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(check.article_id)
    .bind(check.claim)
    .bind(check.verdict)
    .bind(check.explanation)
    .bind(check.confidence)
    .bind(serde_json::to_string(check.sources)?)
    .bind(time::now_db())
    .execute(pool)
    .await?;

    Ok(id)
}

/// Stored fact checks, newest first
pub async fn fact_checks_for_article(pool: &SqlitePool, article_id: &str) -> Result<Vec<FactCheck>> {
    let rows = sqlx::query(
        r#"
        SELECT id, article_id, claim, verdict, explanation, confidence, sources, created_at
        FROM fact_checks
        WHERE article_id = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(article_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(FactCheck {
                id: row.try_get("id")?,
                article_id: row.try_get("article_id")?,
                claim: row.try_get("claim")?,
                verdict: row.try_get("verdict")?,
                explanation: row.try_get("explanation")?,
                confidence: row.try_get("confidence")?,
                sources: string_list(row, "sources")?,
                created_at: timestamp(row, "created_at")?,
            })
        })
        .collect()
}
