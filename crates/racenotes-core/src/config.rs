//! Environment-based configuration.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default bucket name for media uploads.
pub const DEFAULT_BUCKET: &str = "race-media";

/// Default on-disk cache directory (relative to the working directory).
pub const DEFAULT_CACHE_DIR: &str = ".racenotes-cache";

/// Process-wide configuration read from the environment.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Postgres connection URL for the hosted backend.
    pub database_url: String,
    /// Base URL of the object storage service, e.g. `https://host/storage/v1`.
    /// When unset, media uploads use the filesystem backend.
    pub storage_url: Option<String>,
    /// API key sent with storage requests.
    pub storage_key: Option<String>,
    /// Bucket name for media uploads.
    pub storage_bucket: String,
    /// Directory for the local offline cache.
    pub cache_dir: PathBuf,
}

impl CoreConfig {
    /// Read configuration from the environment (with `.env` support).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DATABASE_URL` | required | Postgres connection URL |
    /// | `STORAGE_URL` | unset | Object storage base URL |
    /// | `STORAGE_KEY` | unset | Object storage API key |
    /// | `STORAGE_BUCKET` | `race-media` | Media bucket name |
    /// | `CACHE_DIR` | `.racenotes-cache` | Local cache directory |
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| Error::Config("DATABASE_URL is not set".into()))?;

        Ok(Self {
            database_url,
            storage_url: std::env::var("STORAGE_URL").ok(),
            storage_key: std::env::var("STORAGE_KEY").ok(),
            storage_bucket: std::env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| DEFAULT_BUCKET.to_string()),
            cache_dir: std::env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_DIR)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(DEFAULT_BUCKET, "race-media");
        assert_eq!(DEFAULT_CACHE_DIR, ".racenotes-cache");
    }
}
