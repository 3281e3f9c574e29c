//! # racenotes-cache
//!
//! Durable on-disk local store for racenotes: reference-data caches, a
//! cached note feed, and the pending-write outbox.
//!
//! The store is a read replica plus an outbox, used only when the remote
//! gateway is unavailable. There is no fallback beneath it: disk failures
//! are surfaced to the caller.

pub mod store;

pub use store::FileLocalStore;

// Re-export core types
pub use racenotes_core::{LocalStore, PendingWrite, ReferenceKind, ReferenceSet};
