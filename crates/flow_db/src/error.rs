//! Error types for the database layer.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Database error types.
#[derive(Debug, Error, Diagnostic)]
pub enum DbError {
    /// SQLite/sqlx error
    #[error("Database error: {0}")]
    #[diagnostic(code(flow_db::sqlx))]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    #[diagnostic(code(flow_db::migration))]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A uniqueness constraint rejected the write
    #[error("{entity_type} already exists: {id}")]
    #[diagnostic(code(flow_db::already_exists))]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },

    /// Invalid data
    #[error("Invalid data: {message}")]
    #[diagnostic(code(flow_db::invalid_data))]
    InvalidData { message: String },
}

impl DbError {
    /// Create an already exists error.
    pub fn already_exists(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity_type,
            id: id.into(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Whether this error came from a uniqueness constraint.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Map a unique-constraint violation to [`DbError::AlreadyExists`], passing
/// every other error through.
pub(crate) fn map_unique_violation(
    err: sqlx::Error,
    entity_type: &'static str,
    id: impl Into<String>,
) -> DbError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            DbError::already_exists(entity_type, id)
        }
        _ => DbError::Sqlx(err),
    }
}
