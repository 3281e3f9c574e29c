//! Mock remote gateway for deterministic testing.
//!
//! Simulates a reachable or unreachable backend with an availability
//! toggle, records every applied note for assertions, and can be armed to
//! reject specific note bodies or to drop connectivity after a number of
//! successful writes.
//!
//! ## Usage
//!
//! ```rust
//! use racenotes_sync::mock::MockRemoteGateway;
//!
//! let gateway = MockRemoteGateway::new();
//! gateway.go_offline();
//! // create_note now fails with Error::Connectivity
//! gateway.go_online();
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use racenotes_core::defaults::MEDIA_MAX_BYTES;
use racenotes_core::{
    CreateNoteRequest, Error, Media, MediaKind, NoteFilter, NoteView, ReferenceKind, ReferenceSet,
    RemoteGateway, Result,
};

#[derive(Default)]
struct MockState {
    notes: Vec<(Uuid, CreateNoteRequest)>,
    reference: HashMap<ReferenceKind, ReferenceSet>,
    feed: Vec<NoteView>,
    media: Vec<Media>,
    rejected_bodies: HashSet<String>,
    create_calls: usize,
    /// When set, connectivity drops after this many more successful
    /// creates.
    creates_until_offline: Option<usize>,
}

/// In-memory remote gateway for tests and demos.
#[derive(Clone)]
pub struct MockRemoteGateway {
    available: Arc<AtomicBool>,
    state: Arc<Mutex<MockState>>,
}

impl MockRemoteGateway {
    /// Create a new mock gateway, reachable by default.
    pub fn new() -> Self {
        Self {
            available: Arc::new(AtomicBool::new(true)),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Seed the reference rows returned for a kind.
    pub fn with_reference(self, set: ReferenceSet) -> Self {
        self.state
            .lock()
            .unwrap()
            .reference
            .insert(set.kind(), set);
        self
    }

    /// Seed the note feed.
    pub fn with_feed(self, feed: Vec<NoteView>) -> Self {
        self.state.lock().unwrap().feed = feed;
        self
    }

    /// Arm a fatal `InvalidInput` rejection for notes with this exact body.
    pub fn reject_body(&self, body: impl Into<String>) {
        self.state.lock().unwrap().rejected_bodies.insert(body.into());
    }

    /// Drop connectivity after `n` more successful note creates.
    pub fn fail_creates_after(&self, n: usize) {
        self.state.lock().unwrap().creates_until_offline = Some(n);
    }

    /// Make the backend unreachable.
    pub fn go_offline(&self) {
        self.available.store(false, Ordering::SeqCst);
    }

    /// Make the backend reachable again.
    pub fn go_online(&self) {
        self.available.store(true, Ordering::SeqCst);
        self.state.lock().unwrap().creates_until_offline = None;
    }

    /// Bodies of applied notes, in application order.
    pub fn applied_bodies(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .notes
            .iter()
            .map(|(_, req)| req.body.clone())
            .collect()
    }

    /// Number of notes applied.
    pub fn applied_count(&self) -> usize {
        self.state.lock().unwrap().notes.len()
    }

    /// Total create_note attempts, including failed ones.
    pub fn create_call_count(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    fn check_reachable(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Connectivity("mock backend unreachable".into()))
        }
    }
}

impl Default for MockRemoteGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteGateway for MockRemoteGateway {
    async fn create_note(&self, req: CreateNoteRequest) -> Result<Uuid> {
        {
            let mut state = self.state.lock().unwrap();
            state.create_calls += 1;
        }
        self.check_reachable()?;

        let mut state = self.state.lock().unwrap();
        if req.body.trim().is_empty() {
            return Err(Error::InvalidInput("note body must not be empty".into()));
        }
        if state.rejected_bodies.contains(&req.body) {
            return Err(Error::InvalidInput(format!(
                "note rejected: {}",
                req.body
            )));
        }

        let id = Uuid::new_v4();
        state.notes.push((id, req));

        if let Some(remaining) = state.creates_until_offline {
            let remaining = remaining.saturating_sub(1);
            if remaining == 0 {
                state.creates_until_offline = None;
                self.available.store(false, Ordering::SeqCst);
            } else {
                state.creates_until_offline = Some(remaining);
            }
        }

        Ok(id)
    }

    async fn fetch_reference(&self, kind: ReferenceKind) -> Result<ReferenceSet> {
        self.check_reachable()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .reference
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| ReferenceSet::empty(kind)))
    }

    async fn fetch_note_feed(&self, filter: NoteFilter) -> Result<Vec<NoteView>> {
        self.check_reachable()?;
        let state = self.state.lock().unwrap();
        let limit = filter.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        Ok(state.feed.iter().take(limit).cloned().collect())
    }

    async fn upload_media(
        &self,
        data: &[u8],
        kind: MediaKind,
        filename: &str,
        note_id: Uuid,
    ) -> Result<Media> {
        self.check_reachable()?;
        if data.len() > MEDIA_MAX_BYTES {
            return Err(Error::InvalidInput(format!(
                "file too large: {} bytes",
                data.len()
            )));
        }

        let media = Media {
            id: Uuid::new_v4(),
            note_id,
            file_url: format!("mock://media/{filename}"),
            kind,
            size_mb: Some(data.len() as f64 / (1024.0 * 1024.0)),
            filename: Some(filename.to_string()),
            created_at_utc: Utc::now(),
        };
        self.state.lock().unwrap().media.push(media.clone());
        Ok(media)
    }

    async fn delete_note(&self, id: Uuid) -> Result<()> {
        self.check_reachable()?;
        let mut state = self.state.lock().unwrap();
        let before = state.notes.len();
        state.notes.retain(|(note_id, _)| *note_id != id);
        if state.notes.len() == before {
            return Err(Error::NotFound(format!("note {id} not found")));
        }
        state.media.retain(|m| m.note_id != id);
        Ok(())
    }
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
            created_by: "tester".to_string(),
            driver_id: None,
            session: None,
            tags: Vec::new(),
            media: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_offline_create_is_connectivity_error() {
        let gateway = MockRemoteGateway::new();
        gateway.go_offline();

        let err = gateway.create_note(request("test")).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(gateway.applied_count(), 0);
        assert_eq!(gateway.create_call_count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_body_is_fatal() {
        let gateway = MockRemoteGateway::new();
        gateway.reject_body("bad note");

        let err = gateway.create_note(request("bad note")).await.unwrap_err();
        assert!(err.is_fatal_request());
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_fail_creates_after_drops_connectivity() {
        let gateway = MockRemoteGateway::new();
        gateway.fail_creates_after(2);

        assert!(gateway.create_note(request("one")).await.is_ok());
        assert!(gateway.create_note(request("two")).await.is_ok());
        let err = gateway.create_note(request("three")).await.unwrap_err();
        assert!(err.is_retryable());

        gateway.go_online();
        assert!(gateway.create_note(request("three")).await.is_ok());
        assert_eq!(gateway.applied_bodies(), vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_delete_note_cascades_media() {
        let gateway = MockRemoteGateway::new();
        let id = gateway.create_note(request("with media")).await.unwrap();
        gateway
            .upload_media(b"bytes", MediaKind::Image, "turn3.png", id)
            .await
            .unwrap();

        gateway.delete_note(id).await.unwrap();
        assert_eq!(gateway.applied_count(), 0);
        assert!(gateway.state.lock().unwrap().media.is_empty());

        let err = gateway.delete_note(id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
