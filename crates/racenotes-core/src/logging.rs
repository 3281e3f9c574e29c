//! Structured logging field name constants for racenotes.
//!
//! All crates use these constants for consistent structured logging
//! fields, so log tooling can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Local persistence failure, requires attention |
//! | WARN  | Degraded mode entered, fatal queue item dropped |
//! | INFO  | Lifecycle events, drain completions |
//! | DEBUG | Decision points, cache fallbacks |
//! | TRACE | Per-row iteration |

/// Subsystem originating the log event.
/// Values: "sync", "db", "cache", "storage"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "coordinator", "drain_worker", "pool", "outbox"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "submit_note", "drain", "fetch_reference"
pub const OPERATION: &str = "op";

/// Note UUID being operated on.
pub const NOTE_ID: &str = "note_id";

/// Pending-write sequence number.
pub const SEQUENCE: &str = "sequence";

/// Reference kind ("track", "series", "driver", "tag").
pub const REFERENCE_KIND: &str = "reference_kind";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows returned or processed.
pub const RESULT_COUNT: &str = "result_count";

/// Number of pending writes in the outbox.
pub const QUEUE_LEN: &str = "queue_len";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
