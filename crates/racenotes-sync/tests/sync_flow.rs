//! End-to-end sync flow tests: coordinator + file-backed local store +
//! mock gateway.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use racenotes_cache::FileLocalStore;
use racenotes_sync::{
    CreateNoteRequest, DrainConfig, DrainWorker, MockRemoteGateway, NoteCategory, NoteFilter,
    ReferenceKind, ReferenceSet, SubmitOutcome, SyncCoordinator, SyncEvent, SyncState, Track,
    TrackType,
};

fn request(body: &str) -> CreateNoteRequest {
    CreateNoteRequest {
        body: body.to_string(),
        shared: true,
        category: NoteCategory::General,
        created_by: "spotter1".to_string(),
        driver_id: None,
        session: None,
        tags: Vec::new(),
        media: Vec::new(),
    }
}

fn tracks(names: &[&str]) -> ReferenceSet {
    ReferenceSet::Tracks(
        names
            .iter()
            .map(|name| Track {
                id: Uuid::new_v4(),
                name: name.to_string(),
                track_type: TrackType::Intermediate,
                created_at_utc: Utc::now(),
            })
            .collect(),
    )
}

async fn setup(dir: &TempDir) -> (MockRemoteGateway, Arc<SyncCoordinator>) {
    let gateway = MockRemoteGateway::new();
    let store = FileLocalStore::open(dir.path()).await.unwrap();
    let coordinator = Arc::new(SyncCoordinator::new(
        Arc::new(gateway.clone()),
        Arc::new(store),
    ));
    (gateway, coordinator)
}

#[tokio::test]
async fn test_online_submit_is_synced() {
    let dir = TempDir::new().unwrap();
    let (gateway, coordinator) = setup(&dir).await;

    let outcome = coordinator.submit_note(request("green flag")).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Synced(_)));
    assert_eq!(gateway.applied_bodies(), vec!["green flag"]);
    assert_eq!(coordinator.state(), SyncState::Online);
    assert_eq!(coordinator.pending_count().await, 0);
}

#[tokio::test]
async fn test_offline_submit_queues() {
    let dir = TempDir::new().unwrap();
    let (gateway, coordinator) = setup(&dir).await;
    gateway.go_offline();

    let outcome = coordinator.submit_note(request("caution out")).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Queued(1));
    assert_eq!(coordinator.state(), SyncState::Degraded);
    assert_eq!(coordinator.pending_count().await, 1);
    assert_eq!(gateway.applied_count(), 0);
}

#[tokio::test]
async fn test_fatal_submit_propagates_and_never_queues() {
    let dir = TempDir::new().unwrap();
    let (gateway, coordinator) = setup(&dir).await;
    gateway.reject_body("duplicate entry");

    let err = coordinator
        .submit_note(request("duplicate entry"))
        .await
        .unwrap_err();
    assert!(err.is_fatal_request());
    assert_eq!(coordinator.pending_count().await, 0);
    // A fatal response proves the backend is reachable.
    assert_eq!(coordinator.state(), SyncState::Online);
}

#[tokio::test]
async fn test_drain_applies_fifo_exactly_once() {
    let dir = TempDir::new().unwrap();
    let (gateway, coordinator) = setup(&dir).await;
    gateway.go_offline();

    for body in ["first", "second", "third"] {
        coordinator.submit_note(request(body)).await.unwrap();
    }
    assert_eq!(coordinator.pending_count().await, 3);

    gateway.go_online();
    let report = coordinator.drain_pending_writes().await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.applied.len(), 3);
    assert_eq!(gateway.applied_bodies(), vec!["first", "second", "third"]);
    assert_eq!(coordinator.pending_count().await, 0);
    assert_eq!(coordinator.state(), SyncState::Online);

    // Idempotence: an immediate second drain touches nothing.
    let calls_before = gateway.create_call_count();
    let report = coordinator.drain_pending_writes().await.unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(gateway.create_call_count(), calls_before);
}

#[tokio::test]
async fn test_drain_stops_at_connectivity_loss_and_resumes() {
    let dir = TempDir::new().unwrap();
    let (gateway, coordinator) = setup(&dir).await;
    gateway.go_offline();

    for body in ["one", "two", "three"] {
        coordinator.submit_note(request(body)).await.unwrap();
    }

    // Backend comes back but drops again after one applied write.
    gateway.go_online();
    gateway.fail_creates_after(1);

    let report = coordinator.drain_pending_writes().await.unwrap();
    assert_eq!(report.applied.len(), 1);
    assert_eq!(report.deferred, 2);
    assert_eq!(coordinator.state(), SyncState::Degraded);
    assert_eq!(coordinator.pending_count().await, 2);

    // Reconnect and finish; applied writes are never replayed.
    gateway.go_online();
    let report = coordinator.drain_pending_writes().await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.applied.len(), 2);
    assert_eq!(gateway.applied_bodies(), vec!["one", "two", "three"]);
}

#[tokio::test]
async fn test_drain_drops_rejected_item_and_continues() {
    let dir = TempDir::new().unwrap();
    let (gateway, coordinator) = setup(&dir).await;
    gateway.go_offline();

    for body in ["good one", "bad apple", "good two"] {
        coordinator.submit_note(request(body)).await.unwrap();
    }

    gateway.go_online();
    gateway.reject_body("bad apple");

    let report = coordinator.drain_pending_writes().await.unwrap();
    assert_eq!(report.applied.len(), 2);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].0, 2);
    assert_eq!(report.deferred, 0);
    assert_eq!(gateway.applied_bodies(), vec!["good one", "good two"]);
    // The rejected item does not wedge the queue.
    assert_eq!(coordinator.pending_count().await, 0);
}

#[tokio::test]
async fn test_degraded_submit_drains_queue_first() {
    let dir = TempDir::new().unwrap();
    let (gateway, coordinator) = setup(&dir).await;
    gateway.go_offline();

    coordinator.submit_note(request("queued earlier")).await.unwrap();
    assert_eq!(coordinator.state(), SyncState::Degraded);

    // Backend recovers before the next foreground submission; the queued
    // note must land before the new one.
    gateway.go_online();
    let outcome = coordinator.submit_note(request("fresh note")).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Synced(_)));
    assert_eq!(
        gateway.applied_bodies(),
        vec!["queued earlier", "fresh note"]
    );
    assert_eq!(coordinator.pending_count().await, 0);
    assert_eq!(coordinator.state(), SyncState::Online);
}

#[tokio::test]
async fn test_reference_read_falls_back_to_cache() {
    let dir = TempDir::new().unwrap();
    let gateway = MockRemoteGateway::new().with_reference(tracks(&["Bristol", "Daytona"]));
    let store = FileLocalStore::open(dir.path()).await.unwrap();
    let coordinator = SyncCoordinator::new(Arc::new(gateway.clone()), Arc::new(store));

    let outcome = coordinator
        .load_reference_data(ReferenceKind::Track)
        .await
        .unwrap();
    assert!(!outcome.is_cached());
    assert_eq!(outcome.value().len(), 2);

    gateway.go_offline();
    let outcome = coordinator
        .load_reference_data(ReferenceKind::Track)
        .await
        .unwrap();
    assert!(outcome.is_cached());
    assert_eq!(outcome.value().len(), 2);
    assert_eq!(coordinator.state(), SyncState::Degraded);
}

#[tokio::test]
async fn test_first_run_offline_read_is_empty_cached() {
    let dir = TempDir::new().unwrap();
    let (gateway, coordinator) = setup(&dir).await;
    gateway.go_offline();

    for kind in ReferenceKind::ALL {
        let outcome = coordinator.load_reference_data(kind).await.unwrap();
        assert!(outcome.is_cached());
        assert!(outcome.value().is_empty());
        assert_eq!(outcome.value().kind(), kind);
    }
}

#[tokio::test]
async fn test_feed_read_falls_back_to_cache() {
    let dir = TempDir::new().unwrap();
    let (gateway, coordinator) = setup(&dir).await;

    // Apply one note remotely, then mirror it into the mock feed the way
    // the hosted view would.
    let id = match coordinator.submit_note(request("pit stall 14")).await.unwrap() {
        SubmitOutcome::Synced(id) => id,
        other => panic!("expected synced, got {other:?}"),
    };
    let gateway = gateway.with_feed(vec![racenotes_sync::NoteView {
        id,
        body: "pit stall 14".to_string(),
        shared: true,
        category: NoteCategory::General,
        created_by: "spotter1".to_string(),
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
    }]);

    let outcome = coordinator.load_note_feed(NoteFilter::default()).await.unwrap();
    assert!(!outcome.is_cached());
    assert_eq!(outcome.value().len(), 1);

    gateway.go_offline();
    let outcome = coordinator.load_note_feed(NoteFilter::default()).await.unwrap();
    assert!(outcome.is_cached());
    assert_eq!(outcome.value().len(), 1);
    assert_eq!(outcome.value()[0].body, "pit stall 14");
}

#[tokio::test]
async fn test_queue_survives_restart() {
    let dir = TempDir::new().unwrap();
    let gateway = MockRemoteGateway::new();
    gateway.go_offline();

    {
        let store = FileLocalStore::open(dir.path()).await.unwrap();
        let coordinator =
            SyncCoordinator::new(Arc::new(gateway.clone()), Arc::new(store));
        coordinator.submit_note(request("before restart")).await.unwrap();
    }

    // New process: fresh store over the same directory.
    let store = FileLocalStore::open(dir.path()).await.unwrap();
    let coordinator = SyncCoordinator::new(Arc::new(gateway.clone()), Arc::new(store));
    assert_eq!(coordinator.pending_count().await, 1);

    gateway.go_online();
    let report = coordinator.drain_pending_writes().await.unwrap();
    assert_eq!(report.applied.len(), 1);
    assert_eq!(gateway.applied_bodies(), vec!["before restart"]);
}

#[tokio::test]
async fn test_drain_worker_drains_on_reconnect() {
    let dir = TempDir::new().unwrap();
    let (gateway, coordinator) = setup(&dir).await;
    gateway.go_offline();

    coordinator.submit_note(request("while offline")).await.unwrap();

    let worker = DrainWorker::new(
        coordinator.clone(),
        DrainConfig::default().with_interval(Duration::from_millis(20)),
    );
    let handle = worker.start();
    let mut events = handle.events();

    gateway.go_online();

    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(SyncEvent::QueueDrained { applied }) => break applied,
                Ok(_) => continue,
                Err(e) => panic!("event stream closed: {e}"),
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(drained, 1);
    assert_eq!(gateway.applied_bodies(), vec!["while offline"]);
    assert_eq!(coordinator.pending_count().await, 0);

    handle.shutdown().await.unwrap();
    let stopped = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(SyncEvent::WorkerStopped) => break,
                Ok(_) => continue,
                Err(e) => panic!("event stream closed: {e}"),
            }
        }
    })
    .await;
    assert!(stopped.is_ok());
}

#[tokio::test]
async fn test_drain_worker_defers_while_offline() {
    let dir = TempDir::new().unwrap();
    let (gateway, coordinator) = setup(&dir).await;
    gateway.go_offline();

    coordinator.submit_note(request("stuck")).await.unwrap();

    let worker = DrainWorker::new(
        coordinator.clone(),
        DrainConfig::default().with_interval(Duration::from_millis(20)),
    );
    let handle = worker.start();
    let mut events = handle.events();

    let remaining = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(SyncEvent::DrainDeferred { remaining }) => break remaining,
                Ok(_) => continue,
                Err(e) => panic!("event stream closed: {e}"),
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(remaining, 1);
    assert_eq!(coordinator.pending_count().await, 1);
    handle.shutdown().await.unwrap();
}
