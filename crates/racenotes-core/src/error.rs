//! Error types and the retryable/fatal classification contract.
//!
//! The sync coordinator decides enqueue-vs-surface entirely from this
//! classification: connectivity failures are retryable, request failures
//! are fatal, and local persistence failures are always surfaced because
//! there is no fallback beneath the local store.

use thiserror::Error;

/// Result type alias using racenotes' Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for racenotes operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Remote backend unreachable (timeout, DNS failure, connection refused).
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Database operation failed (non-connectivity sqlx failure).
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Resource not found (missing row or required foreign key).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input rejected before or by the remote store.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authentication failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Object storage upload/download failed for a non-connectivity reason.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Local cache store failed (corrupt document, bad sequence state).
    #[error("Cache error: {0}")]
    Cache(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the failure signals "unreachable, try again later".
    ///
    /// Only connectivity errors qualify. Everything else either means the
    /// request itself is invalid or that local persistence broke, and
    /// re-attempting would repeat the failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Connectivity(_))
    }

    /// True when the remote store rejected the request itself.
    pub fn is_fatal_request(&self) -> bool {
        matches!(
            self,
            Error::Database(_)
                | Error::NotFound(_)
                | Error::InvalidInput(_)
                | Error::Unauthorized(_)
                | Error::Forbidden(_)
                | Error::Storage(_)
        )
    }

    /// True when the local store itself failed. Always surfaced.
    pub fn is_local_persistence(&self) -> bool {
        matches!(
            self,
            Error::Cache(_) | Error::Io(_) | Error::Serialization(_)
        )
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        match e {
            // Network-level failures reach sqlx as I/O or pool exhaustion.
            sqlx::Error::Io(io) => Error::Connectivity(io.to_string()),
            sqlx::Error::PoolTimedOut => {
                Error::Connectivity("database pool acquire timed out".into())
            }
            sqlx::Error::PoolClosed => Error::Connectivity("database pool closed".into()),
            sqlx::Error::Tls(tls) => Error::Connectivity(tls.to_string()),
            sqlx::Error::RowNotFound => Error::NotFound("row not found".into()),
            other => Error::Database(other),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            Error::Connectivity(e.to_string())
        } else {
            Error::Storage(e.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
