//! Centralized default constants for racenotes.
//!
//! **This module is the single source of truth** for shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// REMOTE GATEWAY
// =============================================================================

/// Bounded timeout applied to every remote gateway call, in seconds.
/// Elapse is treated as a retryable connectivity failure.
pub const REMOTE_TIMEOUT_SECS: u64 = 15;

/// Default maximum connections in the Postgres pool.
pub const POOL_MAX_CONNECTIONS: u32 = 5;

/// Default pool acquire timeout in seconds. Kept short so an unreachable
/// backend degrades quickly instead of hanging a submission.
pub const POOL_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Maximum upload size accepted by the media path, in bytes (100 MB).
pub const MEDIA_MAX_BYTES: usize = 100 * 1024 * 1024;

// =============================================================================
// FEED
// =============================================================================

/// Default page size for the note feed.
pub const FEED_LIMIT: i64 = 100;

// =============================================================================
// LOCAL STORE
// =============================================================================

/// Maximum notes retained in the local feed cache; oldest beyond this are
/// trimmed on each refresh.
pub const FEED_CACHE_LIMIT: usize = 500;

/// Cache age beyond which cached reads are considered stale, in hours.
pub const CACHE_STALE_AFTER_HOURS: i64 = 24;

// =============================================================================
// DRAIN WORKER
// =============================================================================

/// Default interval between reconnect checks, in seconds.
pub const DRAIN_INTERVAL_SECS: u64 = 30;

/// Capacity of the drain worker's broadcast event channel.
pub const EVENT_BUS_CAPACITY: usize = 64;
