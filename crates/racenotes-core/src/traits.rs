//! Core traits for racenotes abstractions.
//!
//! These traits define the seams between the sync coordinator and its two
//! collaborators, enabling pluggable backends and testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// REMOTE GATEWAY
// =============================================================================

/// Thin client over the hosted database's query and storage APIs.
///
/// Implementations must honor the error classification contract: failures
/// to reach the backend (timeout, DNS, connection refused) surface as
/// `Error::Connectivity` and nothing else does. The sync coordinator
/// depends entirely on that to decide enqueue-vs-surface.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Insert a note row plus its tag associations and media rows in one
    /// logical unit. Returns the identifier assigned by the remote store.
    async fn create_note(&self, req: CreateNoteRequest) -> Result<Uuid>;

    /// Fetch current rows for the given reference kind.
    async fn fetch_reference(&self, kind: ReferenceKind) -> Result<ReferenceSet>;

    /// Fetch notes joined with track/series/driver/session/tag/media,
    /// newest first, matching the optional filters.
    async fn fetch_note_feed(&self, filter: NoteFilter) -> Result<Vec<NoteView>>;

    /// Store raw bytes in object storage and record the corresponding
    /// media row. Returns the row with its durable public URL.
    async fn upload_media(
        &self,
        data: &[u8],
        kind: MediaKind,
        filename: &str,
        note_id: Uuid,
    ) -> Result<Media>;

    /// Delete a note, cascading to its media rows and tag associations.
    async fn delete_note(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// LOCAL STORE
// =============================================================================

/// Durable on-disk cache surviving process restarts, used only when the
/// remote gateway is unavailable.
///
/// Reference caches are a read replica, never the source of truth; they
/// are overwritten wholesale on every successful remote fetch. The pending
/// write queue is the one place local state carries writes.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Last-known set for `kind`. Missing data is a degraded result, not
    /// an error: returns the empty set when never populated.
    async fn cached_reference(&self, kind: ReferenceKind) -> ReferenceSet;

    /// Idempotent full overwrite of one kind's cache. Called only after a
    /// successful remote fetch.
    async fn replace_cached_reference(&self, set: ReferenceSet) -> Result<()>;

    /// Last-known note feed, newest first, at most `limit` rows.
    async fn cached_feed(&self, limit: usize) -> Vec<NoteView>;

    /// Full overwrite of the cached feed.
    async fn replace_cached_feed(&self, notes: &[NoteView]) -> Result<()>;

    /// Assign the next monotonic sequence number and durably persist the
    /// request. Returns the sequence number.
    async fn enqueue_pending_write(&self, req: CreateNoteRequest) -> Result<u64>;

    /// Queued requests, oldest first. Re-readable after process restart.
    async fn list_pending_writes(&self) -> Result<Vec<PendingWrite>>;

    /// Idempotent removal; no-op if already removed.
    async fn remove_pending_write(&self, sequence: u64) -> Result<()>;

    /// Number of queued pending writes.
    async fn pending_count(&self) -> usize;
}
