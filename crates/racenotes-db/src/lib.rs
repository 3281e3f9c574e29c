//! # racenotes-db
//!
//! PostgreSQL and object-storage layer for racenotes: the remote gateway.
//!
//! This crate provides:
//! - Connection pool management
//! - Repositories for notes, reference data, and media
//! - The denormalized `note_feed` view query
//! - Storage backends (HTTP bucket, filesystem) for media uploads
//! - The `PgRemoteGateway` implementation of `RemoteGateway`, which
//!   applies bounded timeouts and the retryable/fatal classification
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use racenotes_db::{FilesystemBackend, PgRemoteGateway, RemoteDatabase};
//!
//! let db = RemoteDatabase::connect("postgres://localhost/racenotes").await?;
//! let storage = Arc::new(FilesystemBackend::new("/var/racenotes/media"));
//! let gateway = PgRemoteGateway::new(db, storage);
//! ```

pub mod gateway;
pub mod media;
pub mod notes;
pub mod pool;
pub mod reference;
pub mod storage;

// Re-export core types
pub use racenotes_core::*;

pub use gateway::PgRemoteGateway;
pub use media::PgMediaRepository;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use reference::{validate_tag_label, PgReferenceRepository};
pub use storage::{generate_storage_path, FilesystemBackend, HttpBucketBackend, StorageBackend};

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Combined database context with all repositories.
pub struct RemoteDatabase {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Note repository (rows, tag links, media rows, feed view).
    pub notes: PgNoteRepository,
    /// Reference-data repository (tracks, series, drivers, tags).
    pub reference: PgReferenceRepository,
    /// Media repository.
    pub media: PgMediaRepository,
}

impl RemoteDatabase {
    /// Create a new RemoteDatabase from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            reference: PgReferenceRepository::new(pool.clone()),
            media: PgMediaRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new RemoteDatabase by connecting to the given URL.
    ///
    /// The pool connects lazily, so this succeeds even while offline;
    /// connectivity is classified per operation.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for RemoteDatabase {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50% off"), "50\\% off");
        assert_eq!(escape_like("turn_3"), "turn\\_3");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("plain"), "plain");
    }
}
