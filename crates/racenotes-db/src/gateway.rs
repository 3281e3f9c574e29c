//! The remote gateway: repositories plus storage behind one trait object,
//! with bounded timeouts and the error classification applied at this
//! boundary.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use racenotes_core::defaults::{MEDIA_MAX_BYTES, REMOTE_TIMEOUT_SECS};
use racenotes_core::{
    CreateNoteRequest, Error, Media, MediaInfo, MediaKind, NoteFilter, NoteView, ReferenceKind,
    ReferenceSet, RemoteGateway, Result,
};

use crate::storage::{generate_storage_path, StorageBackend};
use crate::RemoteDatabase;

/// Remote gateway backed by Postgres and an object-storage bucket.
pub struct PgRemoteGateway {
    db: RemoteDatabase,
    storage: Arc<dyn StorageBackend>,
    timeout: Duration,
}

impl PgRemoteGateway {
    /// Create a gateway over a connected database and storage backend.
    pub fn new(db: RemoteDatabase, storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            db,
            storage,
            timeout: Duration::from_secs(REMOTE_TIMEOUT_SECS),
        }
    }

    /// Override the bounded call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run a remote call under the bounded timeout. Elapse means the
    /// backend is unreachable, which is retryable by contract.
    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Connectivity(format!(
                "{op} exceeded {}s timeout",
                self.timeout.as_secs()
            ))),
        };
        debug!(
            subsystem = "db",
            component = "gateway",
            op = op,
            duration_ms = start.elapsed().as_millis() as u64,
            success = result.is_ok(),
            "Remote call finished"
        );
        result
    }
}

#[async_trait]
impl RemoteGateway for PgRemoteGateway {
    async fn create_note(&self, req: CreateNoteRequest) -> Result<Uuid> {
        self.bounded("create_note", self.db.notes.insert(req)).await
    }

    async fn fetch_reference(&self, kind: ReferenceKind) -> Result<ReferenceSet> {
        self.bounded("fetch_reference", self.db.reference.fetch(kind))
            .await
    }

    async fn fetch_note_feed(&self, filter: NoteFilter) -> Result<Vec<NoteView>> {
        self.bounded("fetch_note_feed", self.db.notes.feed(filter))
            .await
    }

    async fn upload_media(
        &self,
        data: &[u8],
        kind: MediaKind,
        filename: &str,
        note_id: Uuid,
    ) -> Result<Media> {
        if data.len() > MEDIA_MAX_BYTES {
            return Err(Error::InvalidInput(format!(
                "file too large: {} bytes (max {})",
                data.len(),
                MEDIA_MAX_BYTES
            )));
        }

        let path = generate_storage_path(kind, filename);
        // The bucket client applies its own request timeout.
        let file_url = self.storage.store(&path, data).await?;

        let info = MediaInfo {
            file_url,
            kind,
            filename: Some(filename.to_string()),
            size_mb: Some(data.len() as f64 / (1024.0 * 1024.0)),
        };
        self.bounded("upload_media", self.db.media.insert(note_id, &info))
            .await
    }

    async fn delete_note(&self, id: Uuid) -> Result<()> {
        self.bounded("delete_note", self.db.notes.delete(id)).await
    }
}
