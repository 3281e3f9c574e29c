//! Demonstrates the offline-first flow end to end with the mock gateway:
//! submit while online, lose connectivity, queue writes, reconnect, drain.
//!
//! Run with: cargo run -p racenotes-sync --example offline_demo

use std::sync::Arc;
use std::time::Duration;

use racenotes_cache::FileLocalStore;
use racenotes_sync::{
    CreateNoteRequest, DrainConfig, DrainWorker, MockRemoteGateway, NoteCategory, SyncCoordinator,
    SyncEvent,
};

fn note(body: &str) -> CreateNoteRequest {
    CreateNoteRequest {
        body: body.to_string(),
        shared: true,
        category: NoteCategory::Track,
        created_by: "demo".to_string(),
        driver_id: None,
        session: None,
        tags: vec!["demo".to_string()],
        media: Vec::new(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cache_dir = tempfile::tempdir()?;
    let gateway = MockRemoteGateway::new();
    let store = FileLocalStore::open(cache_dir.path()).await?;
    let coordinator = Arc::new(SyncCoordinator::new(
        Arc::new(gateway.clone()),
        Arc::new(store),
    ));

    // Online: note is applied remotely straight away.
    let outcome = coordinator.submit_note(note("turn 3 is washing out")).await?;
    println!("online submit  -> {outcome:?}");

    // Offline: notes queue locally instead of failing.
    gateway.go_offline();
    for body in ["pit road grip is poor", "backstretch wind picking up"] {
        let outcome = coordinator.submit_note(note(body)).await?;
        println!("offline submit -> {outcome:?}  (state: {:?})", coordinator.state());
    }
    println!("pending writes: {}", coordinator.pending_count().await);

    // Background worker notices the reconnect and drains the queue.
    let worker = DrainWorker::new(
        coordinator.clone(),
        DrainConfig::default().with_interval(Duration::from_millis(200)),
    );
    let handle = worker.start();
    let mut events = handle.events();

    gateway.go_online();
    loop {
        match events.recv().await? {
            SyncEvent::QueueDrained { applied } => {
                println!("queue drained: {applied} notes applied");
                break;
            }
            event => println!("event: {event:?}"),
        }
    }

    println!("remote now holds: {:?}", gateway.applied_bodies());
    handle.shutdown().await?;
    Ok(())
}
