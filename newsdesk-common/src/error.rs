//! Common error types for newsdesk

use thiserror::Error;

/// Common result type for newsdesk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the service crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the underlying database error is a UNIQUE constraint violation
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Error::Database(err) if is_unique_violation(err))
    }
}

/// UNIQUE constraint violation reported by the database
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// SQLITE_BUSY or SQLITE_LOCKED, including their extended codes
pub fn is_busy(err: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db_err) = err else {
        return false;
    };
    db_err
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        .map(|code| matches!(code & 0xff, 5 | 6))
        .unwrap_or(false)
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_neither_busy_nor_unique() {
        let err = Error::NotFound("Article not found".to_string());
        assert!(!err.is_unique_violation());
        assert!(!is_busy(&sqlx::Error::RowNotFound));
    }
}
