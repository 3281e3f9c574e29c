//! The sync coordinator: remote-first operations with local fallback.
//!
//! Every operation attempts the remote gateway first, regardless of the
//! advisory connectivity flag. Retryable connectivity failures degrade to
//! the local store (writes queue, reads fall back to cache); fatal request
//! failures propagate to the caller untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use racenotes_core::defaults::FEED_CACHE_LIMIT;
use racenotes_core::{
    CreateNoteRequest, LocalStore, NoteFilter, NoteView, ReadOutcome, ReferenceKind, ReferenceSet,
    RemoteGateway, Result, SubmitOutcome, SyncState,
};

/// Result of one drain pass over the pending-write queue.
#[derive(Debug, Clone, Default)]
pub struct DrainReport {
    /// Sequences applied remotely, paired with their assigned identifiers.
    pub applied: Vec<(u64, Uuid)>,
    /// Sequences the remote store rejected outright; removed from the
    /// queue so one bad item cannot wedge everything behind it.
    pub rejected: Vec<(u64, String)>,
    /// Items left queued because connectivity dropped mid-pass.
    pub deferred: usize,
}

impl DrainReport {
    /// True when the pass left the queue empty with no rejections.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.deferred == 0
    }
}

/// Coordinates the remote gateway and the local store.
///
/// The connectivity flag is advisory only: it tells the UI what to expect,
/// but never short-circuits a remote attempt. Drains are serialized by a
/// mutex so a timer-driven drain and a foreground submission cannot
/// interleave their queue passes.
pub struct SyncCoordinator {
    gateway: Arc<dyn RemoteGateway>,
    store: Arc<dyn LocalStore>,
    degraded: AtomicBool,
    drain_lock: Mutex<()>,
}

impl SyncCoordinator {
    /// Create a coordinator over a gateway and a local store. Starts in
    /// `Online`; the first failed remote call corrects it.
    pub fn new(gateway: Arc<dyn RemoteGateway>, store: Arc<dyn LocalStore>) -> Self {
        Self {
            gateway,
            store,
            degraded: AtomicBool::new(false),
            drain_lock: Mutex::new(()),
        }
    }

    /// Current advisory connectivity mode.
    pub fn state(&self) -> SyncState {
        if self.degraded.load(Ordering::Acquire) {
            SyncState::Degraded
        } else {
            SyncState::Online
        }
    }

    /// Number of writes waiting in the local outbox.
    pub async fn pending_count(&self) -> usize {
        self.store.pending_count().await
    }

    fn mark_online(&self) {
        if self.degraded.swap(false, Ordering::AcqRel) {
            info!(
                subsystem = "sync",
                component = "coordinator",
                "Connectivity restored, back online"
            );
        }
    }

    fn mark_degraded(&self) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            warn!(
                subsystem = "sync",
                component = "coordinator",
                "Remote unreachable, entering degraded mode"
            );
        }
    }

    /// Submit a note.
    ///
    /// When degraded with queued writes, first attempts an opportunistic
    /// drain so the new note lands after everything queued before it. The
    /// note then goes remote-first: a connectivity failure queues it and
    /// returns `Queued`, a fatal failure propagates without queueing.
    pub async fn submit_note(&self, req: CreateNoteRequest) -> Result<SubmitOutcome> {
        if self.state() == SyncState::Degraded && self.store.pending_count().await > 0 {
            if let Err(e) = self.drain_pending_writes().await {
                warn!(
                    subsystem = "sync",
                    component = "coordinator",
                    op = "submit_note",
                    error = %e,
                    "Opportunistic drain failed"
                );
            }
        }

        match self.gateway.create_note(req.clone()).await {
            Ok(id) => {
                self.mark_online();
                debug!(
                    subsystem = "sync",
                    component = "coordinator",
                    op = "submit_note",
                    note_id = %id,
                    "Note applied remotely"
                );
                Ok(SubmitOutcome::Synced(id))
            }
            Err(e) if e.is_retryable() => {
                self.mark_degraded();
                let sequence = self.store.enqueue_pending_write(req).await?;
                info!(
                    subsystem = "sync",
                    component = "coordinator",
                    op = "submit_note",
                    sequence,
                    queue_len = self.store.pending_count().await,
                    "Note queued for later sync"
                );
                Ok(SubmitOutcome::Queued(sequence))
            }
            Err(e) => {
                // The backend answered, so connectivity is fine; the
                // request itself was rejected.
                self.mark_online();
                Err(e)
            }
        }
    }

    /// Load reference data for one kind, remote-first.
    ///
    /// A successful fetch overwrites the local cache wholesale and returns
    /// `Fresh`. A connectivity failure returns the last-known-good cache as
    /// `Cached`, which is empty on a first run.
    pub async fn load_reference_data(&self, kind: ReferenceKind) -> Result<ReadOutcome<ReferenceSet>> {
        match self.gateway.fetch_reference(kind).await {
            Ok(set) => {
                self.mark_online();
                self.store.replace_cached_reference(set.clone()).await?;
                debug!(
                    subsystem = "sync",
                    component = "coordinator",
                    op = "load_reference_data",
                    reference_kind = kind.as_str(),
                    result_count = set.len(),
                    "Reference data refreshed"
                );
                Ok(ReadOutcome::Fresh(set))
            }
            Err(e) if e.is_retryable() => {
                self.mark_degraded();
                let cached = self.store.cached_reference(kind).await;
                debug!(
                    subsystem = "sync",
                    component = "coordinator",
                    op = "load_reference_data",
                    reference_kind = kind.as_str(),
                    result_count = cached.len(),
                    "Serving cached reference data"
                );
                Ok(ReadOutcome::Cached(cached))
            }
            Err(e) => {
                self.mark_online();
                Err(e)
            }
        }
    }

    /// Load the note feed, remote-first with cache fallback.
    pub async fn load_note_feed(&self, filter: NoteFilter) -> Result<ReadOutcome<Vec<NoteView>>> {
        let limit = filter
            .limit
            .map(|l| l.max(0) as usize)
            .unwrap_or(FEED_CACHE_LIMIT);

        match self.gateway.fetch_note_feed(filter).await {
            Ok(notes) => {
                self.mark_online();
                self.store.replace_cached_feed(&notes).await?;
                debug!(
                    subsystem = "sync",
                    component = "coordinator",
                    op = "load_note_feed",
                    result_count = notes.len(),
                    "Note feed refreshed"
                );
                Ok(ReadOutcome::Fresh(notes))
            }
            Err(e) if e.is_retryable() => {
                self.mark_degraded();
                let cached = self.store.cached_feed(limit).await;
                debug!(
                    subsystem = "sync",
                    component = "coordinator",
                    op = "load_note_feed",
                    result_count = cached.len(),
                    "Serving cached note feed"
                );
                Ok(ReadOutcome::Cached(cached))
            }
            Err(e) => {
                self.mark_online();
                Err(e)
            }
        }
    }

    /// Drain the pending-write queue in FIFO order.
    ///
    /// Each applied item is removed before the next attempt, so a crash
    /// mid-drain never replays an applied write. The first connectivity
    /// failure stops the pass immediately with the rest deferred. A fatal
    /// rejection removes the item and continues, reporting it in
    /// `rejected` so the UI can surface the loss.
    pub async fn drain_pending_writes(&self) -> Result<DrainReport> {
        let _guard = self.drain_lock.lock().await;

        let pending = self.store.list_pending_writes().await?;
        let total = pending.len();
        let mut report = DrainReport::default();

        // An empty pass proves nothing about connectivity.
        if total == 0 {
            return Ok(report);
        }

        for (position, item) in pending.into_iter().enumerate() {
            match self.gateway.create_note(item.request).await {
                Ok(id) => {
                    self.store.remove_pending_write(item.sequence).await?;
                    debug!(
                        subsystem = "sync",
                        component = "coordinator",
                        op = "drain",
                        sequence = item.sequence,
                        note_id = %id,
                        "Queued note applied"
                    );
                    report.applied.push((item.sequence, id));
                }
                Err(e) if e.is_retryable() => {
                    self.mark_degraded();
                    report.deferred = total - position;
                    info!(
                        subsystem = "sync",
                        component = "coordinator",
                        op = "drain",
                        sequence = item.sequence,
                        queue_len = report.deferred,
                        "Drain deferred, remote still unreachable"
                    );
                    return Ok(report);
                }
                Err(e) => {
                    self.store.remove_pending_write(item.sequence).await?;
                    warn!(
                        subsystem = "sync",
                        component = "coordinator",
                        op = "drain",
                        sequence = item.sequence,
                        error = %e,
                        "Queued note rejected by remote, dropping"
                    );
                    report.rejected.push((item.sequence, e.to_string()));
                }
            }
        }

        self.mark_online();
        if !report.applied.is_empty() {
            info!(
                subsystem = "sync",
                component = "coordinator",
                op = "drain",
                result_count = report.applied.len(),
                "Pending writes drained"
            );
        }
        Ok(report)
    }
}
