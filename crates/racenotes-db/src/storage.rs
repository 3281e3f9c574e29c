//! Object storage backends for media uploads.
//!
//! Uploads return a durable, publicly resolvable URL; URLs are permanent,
//! no signed-URL expiry handling is involved.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use racenotes_core::defaults::REMOTE_TIMEOUT_SECS;
use racenotes_core::{Error, MediaKind, Result};

/// Storage backend trait for different storage providers.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write data at the given path and return its public URL.
    async fn store(&self, path: &str, data: &[u8]) -> Result<String>;
}

/// Generate a bucket path for an upload.
///
/// Format: `{videos|images|data}/{YYYY}/{MM}/{uuid}_{filename}`, grouping
/// media by kind and month while keeping names collision-free.
pub fn generate_storage_path(kind: MediaKind, filename: &str) -> String {
    let folder = match kind {
        MediaKind::Video => "videos",
        MediaKind::Image => "images",
        MediaKind::Csv => "data",
    };
    let now = Utc::now();
    let safe_name: String = filename
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "{folder}/{}/{}_{safe_name}",
        now.format("%Y/%m"),
        Uuid::new_v4()
    )
}

// =============================================================================
// HTTP BUCKET BACKEND
// =============================================================================

/// HTTP object-storage backend for hosted buckets.
///
/// Uploads with `POST {base_url}/object/{bucket}/{path}` and derives the
/// permanent public URL as `{base_url}/object/public/{bucket}/{path}`.
pub struct HttpBucketBackend {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    api_key: Option<String>,
}

impl HttpBucketBackend {
    /// Create a new bucket backend. `base_url` is the storage service
    /// root, e.g. `https://host/storage/v1`.
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REMOTE_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            api_key,
        })
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/object/public/{}/{path}", self.base_url, self.bucket)
    }
}

#[async_trait]
impl StorageBackend for HttpBucketBackend {
    async fn store(&self, path: &str, data: &[u8]) -> Result<String> {
        let upload_url = format!("{}/object/{}/{path}", self.base_url, self.bucket);
        debug!(
            subsystem = "storage",
            component = "bucket",
            op = "store",
            path = %path,
            size = data.len(),
            "Uploading to bucket"
        );

        let mut request = self.client.post(&upload_url).body(data.to_vec());
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized("storage rejected API key".into()));
        }
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Forbidden(format!(
                "storage denied write to bucket {}",
                self.bucket
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                subsystem = "storage",
                component = "bucket",
                status = %status,
                error = %body,
                "Bucket upload failed"
            );
            return Err(Error::Storage(format!("upload failed ({status}): {body}")));
        }

        Ok(self.public_url(path))
    }
}

// =============================================================================
// FILESYSTEM BACKEND
// =============================================================================

/// Filesystem storage backend. Used in development and tests; returns
/// `file://` URLs.
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend with the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn store(&self, path: &str, data: &[u8]) -> Result<String> {
        let full_path = self.base_path.join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&temp_path, &full_path).await?;

        Ok(format!("file://{}", full_path.display()))
    }
}
