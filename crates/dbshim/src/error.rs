//! Error types for dbshim

use std::time::Duration;
use thiserror::Error;

/// Result type alias for dbshim operations
pub type DbResult<T> = Result<T, DbError>;

/// Error types for database operations
#[derive(Debug, Error)]
pub enum DbError {
    /// Missing or invalid connection configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Native connect/disconnect/escape failure
    #[error("Connection error [{code}]: {message}")]
    Connection { code: String, message: String },

    /// Native statement execution failure
    #[error("Query error [{}]: {message} [ {sql} ]", .code.as_deref().unwrap_or("-"))]
    Query {
        code: Option<String>,
        message: String,
        sql: String,
    },

    /// Attempted write through a result cursor
    #[error("Result cursor is read-only")]
    ReadOnlyResult,

    /// A `:name` placeholder in a raw query has no binding
    #[error("Unbound parameter ':{0}'")]
    UnboundParameter(String),

    /// Row value decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Builder or value validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Statement timeout
    #[error("Query timeout after {0:?}")]
    Timeout(Duration),
}

impl DbError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a connection error with a native code
    pub fn connection(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a query error for the given SQL
    pub fn query(message: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::Query {
            code: None,
            message: message.into(),
            sql: sql.into(),
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query { .. })
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnlyResult)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// The SQL text attached to a query error, if any.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Query { sql, .. } => Some(sql),
            _ => None,
        }
    }

    /// Convert a tokio_postgres error raised while connecting.
    pub fn from_pg_connect(err: tokio_postgres::Error) -> Self {
        let code = err
            .code()
            .map(|state| state.code().to_string())
            .unwrap_or_else(|| "08000".to_string());
        Self::Connection {
            code,
            message: pg_message(&err),
        }
    }

    /// Convert a tokio_postgres error raised while executing `sql`.
    pub fn from_pg_query(err: tokio_postgres::Error, sql: &str) -> Self {
        Self::Query {
            code: err.code().map(|state| state.code().to_string()),
            message: pg_message(&err),
            sql: sql.to_string(),
        }
    }
}

/// Prefer the server's message over the wrapper's display text.
fn pg_message(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db_err) => db_err.message().to_string(),
        None => err.to_string(),
    }
}
