//! Repository functions over the newsdesk schema
//!
//! Every function takes the pool (or an open transaction) explicitly and
//! returns domain models from `newsdesk_common::models`.

pub mod agent_logs;
pub mod articles;
pub mod comments;
pub mod images;
pub mod notifications;
pub mod sources;
pub mod users;

use chrono::{DateTime, Utc};
use newsdesk_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// New row id
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Required timestamp column
pub(crate) fn timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let value: String = row.try_get(column)?;
    time::from_db(&value)
}

/// Nullable timestamp column
pub(crate) fn optional_timestamp(row: &SqliteRow, column: &str) -> Result<Option<DateTime<Utc>>> {
    let value: Option<String> = row.try_get(column)?;
    value.as_deref().map(time::from_db).transpose()
}

/// JSON-encoded string list column
pub(crate) fn string_list(row: &SqliteRow, column: &str) -> Result<Vec<String>> {
    let value: String = row.try_get(column)?;
    Ok(serde_json::from_str(&value)?)
}
