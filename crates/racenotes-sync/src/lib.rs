//! # racenotes-sync
//!
//! Offline-first sync layer for racenotes.
//!
//! This crate provides:
//! - `SyncCoordinator`: remote-first reads and writes with local fallback
//! - `DrainWorker`: a recurring reconnect check that drains the
//!   pending-write queue, with events via broadcast channels
//! - `MockRemoteGateway`: an in-memory gateway for tests and demos
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use racenotes_sync::{DrainConfig, DrainWorker, SyncCoordinator};
//!
//! let coordinator = Arc::new(SyncCoordinator::new(gateway, store));
//! let worker = DrainWorker::new(coordinator.clone(), DrainConfig::from_env());
//! let handle = worker.start();
//!
//! // Listen for events
//! let mut events = handle.events();
//! while let Ok(event) = events.recv().await {
//!     println!("Event: {:?}", event);
//! }
//!
//! // Graceful shutdown
//! handle.shutdown().await?;
//! ```

pub mod coordinator;
pub mod mock;
pub mod worker;

// Re-export core types
pub use racenotes_core::*;

pub use coordinator::{DrainReport, SyncCoordinator};
pub use mock::MockRemoteGateway;
pub use worker::{DrainConfig, DrainWorker, SyncEvent, WorkerHandle};
