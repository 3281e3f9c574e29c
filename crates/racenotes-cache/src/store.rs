//! On-disk local store: reference caches, feed cache, pending-write outbox.
//!
//! Three JSON documents under one cache directory, loaded at open and held
//! behind a single mutex. Every mutation rewrites the affected document
//! with an atomic temp-file + rename, so committed writes survive process
//! restarts and a crash mid-write never leaves a torn document.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use async_trait::async_trait;
use racenotes_core::defaults::FEED_CACHE_LIMIT;
use racenotes_core::{
    CreateNoteRequest, Driver, LocalStore, NoteView, PendingWrite, ReferenceKind, ReferenceSet,
    Result, Series, Tag, Track,
};

const REFERENCE_FILE: &str = "reference.json";
const FEED_FILE: &str = "feed.json";
const OUTBOX_FILE: &str = "outbox.json";

/// Cached reference rows, one field per kind. Each field is overwritten
/// wholesale on refresh; the cache is a read replica, never merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ReferenceDocument {
    tracks: Vec<Track>,
    series: Vec<Series>,
    drivers: Vec<Driver>,
    tags: Vec<Tag>,
    last_sync_utc: Option<DateTime<Utc>>,
}

/// Cached note feed, newest first, capped at `FEED_CACHE_LIMIT`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FeedDocument {
    notes: Vec<NoteView>,
    last_sync_utc: Option<DateTime<Utc>>,
}

/// Pending-write outbox. `next_sequence` persists so sequence numbers stay
/// monotonic across restarts even after the queue empties.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OutboxDocument {
    next_sequence: u64,
    pending: Vec<PendingWrite>,
}

impl Default for OutboxDocument {
    fn default() -> Self {
        Self {
            next_sequence: 1,
            pending: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    reference: ReferenceDocument,
    feed: FeedDocument,
    outbox: OutboxDocument,
}

/// File-backed implementation of `LocalStore`.
pub struct FileLocalStore {
    dir: PathBuf,
    state: Mutex<CacheState>,
}

impl FileLocalStore {
    /// Open (or create) the cache directory and load existing documents.
    ///
    /// A corrupt reference or feed document degrades to empty, since
    /// caches are not the source of truth. A corrupt outbox is a local
    /// persistence error and is surfaced: it holds writes.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;

        let reference = match load_document::<ReferenceDocument>(&dir.join(REFERENCE_FILE)).await?
        {
            LoadResult::Loaded(doc) => doc,
            LoadResult::Missing => ReferenceDocument::default(),
            LoadResult::Corrupt(err) => {
                warn!(
                    subsystem = "cache",
                    component = "store",
                    error = %err,
                    "Reference cache corrupt, starting empty"
                );
                ReferenceDocument::default()
            }
        };

        let feed = match load_document::<FeedDocument>(&dir.join(FEED_FILE)).await? {
            LoadResult::Loaded(doc) => doc,
            LoadResult::Missing => FeedDocument::default(),
            LoadResult::Corrupt(err) => {
                warn!(
                    subsystem = "cache",
                    component = "store",
                    error = %err,
                    "Feed cache corrupt, starting empty"
                );
                FeedDocument::default()
            }
        };

        let outbox = match load_document::<OutboxDocument>(&dir.join(OUTBOX_FILE)).await? {
            LoadResult::Loaded(doc) => doc,
            LoadResult::Missing => OutboxDocument::default(),
            LoadResult::Corrupt(err) => return Err(err),
        };

        debug!(
            subsystem = "cache",
            component = "store",
            op = "open",
            queue_len = outbox.pending.len(),
            "Local store opened"
        );

        Ok(Self {
            dir,
            state: Mutex::new(CacheState {
                reference,
                feed,
                outbox,
            }),
        })
    }

    /// When the reference caches were last refreshed from the remote.
    pub async fn last_reference_sync(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.reference.last_sync_utc
    }

    /// True when the reference caches have never been refreshed or are
    /// older than `max_age_hours`.
    pub async fn is_stale(&self, max_age_hours: i64) -> bool {
        match self.last_reference_sync().await {
            Some(last) => Utc::now() - last > Duration::hours(max_age_hours),
            None => true,
        }
    }

    async fn persist_reference(&self, doc: &ReferenceDocument) -> Result<()> {
        write_document(&self.dir.join(REFERENCE_FILE), doc).await
    }

    async fn persist_feed(&self, doc: &FeedDocument) -> Result<()> {
        write_document(&self.dir.join(FEED_FILE), doc).await
    }

    async fn persist_outbox(&self, doc: &OutboxDocument) -> Result<()> {
        write_document(&self.dir.join(OUTBOX_FILE), doc).await
    }
}

#[async_trait]
impl LocalStore for FileLocalStore {
    async fn cached_reference(&self, kind: ReferenceKind) -> ReferenceSet {
        let state = self.state.lock().await;
        match kind {
            ReferenceKind::Track => ReferenceSet::Tracks(state.reference.tracks.clone()),
            ReferenceKind::Series => ReferenceSet::Series(state.reference.series.clone()),
            ReferenceKind::Driver => ReferenceSet::Drivers(state.reference.drivers.clone()),
            ReferenceKind::Tag => ReferenceSet::Tags(state.reference.tags.clone()),
        }
    }

    async fn replace_cached_reference(&self, set: ReferenceSet) -> Result<()> {
        let mut state = self.state.lock().await;
        match set {
            ReferenceSet::Tracks(items) => state.reference.tracks = items,
            ReferenceSet::Series(items) => state.reference.series = items,
            ReferenceSet::Drivers(items) => state.reference.drivers = items,
            ReferenceSet::Tags(items) => state.reference.tags = items,
        }
        state.reference.last_sync_utc = Some(Utc::now());
        self.persist_reference(&state.reference).await
    }

    async fn cached_feed(&self, limit: usize) -> Vec<NoteView> {
        let state = self.state.lock().await;
        state.feed.notes.iter().take(limit).cloned().collect()
    }

    async fn replace_cached_feed(&self, notes: &[NoteView]) -> Result<()> {
        let mut state = self.state.lock().await;
        state.feed.notes = notes.iter().take(FEED_CACHE_LIMIT).cloned().collect();
        state.feed.last_sync_utc = Some(Utc::now());
        self.persist_feed(&state.feed).await
    }

    async fn enqueue_pending_write(&self, req: CreateNoteRequest) -> Result<u64> {
        let mut state = self.state.lock().await;
        let sequence = state.outbox.next_sequence;
        state.outbox.next_sequence += 1;
        state.outbox.pending.push(PendingWrite {
            sequence,
            queued_at_utc: Utc::now(),
            request: req,
        });
        // Durable before returning: the caller reports "queued" only once
        // the request is on disk.
        self.persist_outbox(&state.outbox).await?;

        debug!(
            subsystem = "cache",
            component = "outbox",
            op = "enqueue",
            sequence = sequence,
            queue_len = state.outbox.pending.len(),
            "Pending write enqueued"
        );
        Ok(sequence)
    }

    async fn list_pending_writes(&self) -> Result<Vec<PendingWrite>> {
        let state = self.state.lock().await;
        let mut pending = state.outbox.pending.clone();
        pending.sort_by_key(|w| w.sequence);
        Ok(pending)
    }

    async fn remove_pending_write(&self, sequence: u64) -> Result<()> {
        let mut state = self.state.lock().await;
        let before = state.outbox.pending.len();
        state.outbox.pending.retain(|w| w.sequence != sequence);
        if state.outbox.pending.len() == before {
            // Already removed; idempotent no-op, nothing to persist.
            return Ok(());
        }
        self.persist_outbox(&state.outbox).await
    }

    async fn pending_count(&self) -> usize {
        self.state.lock().await.outbox.pending.len()
    }
}

enum LoadResult<T> {
    Loaded(T),
    Missing,
    Corrupt(racenotes_core::Error),
}

async fn load_document<T: DeserializeOwned>(path: &Path) -> Result<LoadResult<T>> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(doc) => Ok(LoadResult::Loaded(doc)),
            Err(e) => Ok(LoadResult::Corrupt(e.into())),
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LoadResult::Missing),
        Err(e) => Err(e.into()),
    }
}

async fn write_document<T: Serialize>(path: &Path, doc: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(doc)?;

    // Atomic write: temp file + rename
    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(&bytes).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(&temp_path, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use racenotes_core::NoteCategory;

    fn request(body: &str) -> CreateNoteRequest {
        CreateNoteRequest {
            body: body.to_string(),
            shared: true,
            category: NoteCategory::General,
            created_by: "crew".to_string(),
            driver_id: None,
            session: None,
            tags: Vec::new(),
            media: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_reference_cache_empty_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::open(dir.path()).await.unwrap();

        for kind in ReferenceKind::ALL {
            let set = store.cached_reference(kind).await;
            assert!(set.is_empty(), "{kind:?} should start empty");
            assert_eq!(set.kind(), kind);
        }
        assert!(store.is_stale(24).await);
    }

    #[tokio::test]
    async fn test_reference_cache_overwritten_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::open(dir.path()).await.unwrap();

        let series = |name: &str| Series {
            id: uuid::Uuid::new_v4(),
            name: name.to_string(),
            created_at_utc: Utc::now(),
        };

        store
            .replace_cached_reference(ReferenceSet::Series(vec![series("Cup"), series("Trucks")]))
            .await
            .unwrap();
        assert_eq!(store.cached_reference(ReferenceKind::Series).await.len(), 2);

        // A smaller refresh replaces, never merges
        store
            .replace_cached_reference(ReferenceSet::Series(vec![series("Cup")]))
            .await
            .unwrap();
        assert_eq!(store.cached_reference(ReferenceKind::Series).await.len(), 1);
        assert!(!store.is_stale(24).await);
    }

    #[tokio::test]
    async fn test_outbox_fifo_and_monotonic_sequences() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::open(dir.path()).await.unwrap();

        let s1 = store.enqueue_pending_write(request("first")).await.unwrap();
        let s2 = store.enqueue_pending_write(request("second")).await.unwrap();
        let s3 = store.enqueue_pending_write(request("third")).await.unwrap();
        assert!(s1 < s2 && s2 < s3);

        let pending = store.list_pending_writes().await.unwrap();
        let bodies: Vec<&str> = pending.iter().map(|w| w.request.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_outbox_survives_restart() {
        let dir = tempfile::tempdir().unwrap();

        let s2 = {
            let store = FileLocalStore::open(dir.path()).await.unwrap();
            store.enqueue_pending_write(request("loose off 4")).await.unwrap();
            store.enqueue_pending_write(request("turn 3 tight")).await.unwrap()
        };

        // Reopen: queue intact, sequence numbering continues
        let store = FileLocalStore::open(dir.path()).await.unwrap();
        assert_eq!(store.pending_count().await, 2);

        let s3 = store.enqueue_pending_write(request("new note")).await.unwrap();
        assert!(s3 > s2, "sequence must stay monotonic across restarts");
    }

    #[tokio::test]
    async fn test_remove_pending_write_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::open(dir.path()).await.unwrap();

        let seq = store.enqueue_pending_write(request("note")).await.unwrap();
        store.remove_pending_write(seq).await.unwrap();
        assert_eq!(store.pending_count().await, 0);

        // Second removal is a no-op, not an error
        store.remove_pending_write(seq).await.unwrap();
        store.remove_pending_write(9999).await.unwrap();
    }

    #[tokio::test]
    async fn test_sequence_not_reused_after_drain() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::open(dir.path()).await.unwrap();

        let s1 = store.enqueue_pending_write(request("a")).await.unwrap();
        store.remove_pending_write(s1).await.unwrap();

        let s2 = store.enqueue_pending_write(request("b")).await.unwrap();
        assert!(s2 > s1);
    }

    #[tokio::test]
    async fn test_corrupt_reference_cache_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("reference.json"), b"{not json").unwrap();

        let store = FileLocalStore::open(dir.path()).await.unwrap();
        assert!(store.cached_reference(ReferenceKind::Track).await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_outbox_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("outbox.json"), b"{not json").unwrap();

        let result = FileLocalStore::open(dir.path()).await;
        assert!(result.is_err(), "a corrupt outbox holds writes; surface it");
        assert!(result.err().unwrap().is_local_persistence());
    }

    #[tokio::test]
    async fn test_feed_cache_round_trip_and_cap() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLocalStore::open(dir.path()).await.unwrap();

        let note = |body: &str| NoteView {
            id: uuid::Uuid::new_v4(),
            body: body.to_string(),
            shared: true,
            category: NoteCategory::General,
            created_by: "crew".to_string(),
            created_at_utc: Utc::now(),
            updated_at_utc: Utc::now(),
            driver_name: None,
            session_date: None,
            session_kind: None,
            track_name: None,
            track_type: None,
            series_name: None,
            tags: Vec::new(),
            media: Vec::new(),
        };

        let notes: Vec<NoteView> = (0..3).map(|i| note(&format!("note {i}"))).collect();
        store.replace_cached_feed(&notes).await.unwrap();

        let cached = store.cached_feed(2).await;
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].body, "note 0");
    }
}
