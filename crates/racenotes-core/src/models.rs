//! Core data models for racenotes.
//!
//! These types are shared across all racenotes crates and represent the
//! racing-notes domain entities plus the core-to-UI outcome types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// REFERENCE ENTITIES
// =============================================================================

/// Track layout classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackType {
    Superspeedway,
    Intermediate,
    #[serde(rename = "Short Track")]
    ShortTrack,
    #[serde(rename = "Road Course")]
    RoadCourse,
}

impl TrackType {
    /// Wire string stored in the `track.track_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackType::Superspeedway => "Superspeedway",
            TrackType::Intermediate => "Intermediate",
            TrackType::ShortTrack => "Short Track",
            TrackType::RoadCourse => "Road Course",
        }
    }

    /// Parse the wire string back into the enum.
    pub fn parse(s: &str) -> Option<TrackType> {
        match s {
            "Superspeedway" => Some(TrackType::Superspeedway),
            "Intermediate" => Some(TrackType::Intermediate),
            "Short Track" => Some(TrackType::ShortTrack),
            "Road Course" => Some(TrackType::RoadCourse),
            _ => None,
        }
    }
}

/// A race track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: Uuid,
    pub name: String,
    pub track_type: TrackType,
    pub created_at_utc: DateTime<Utc>,
}

/// A racing series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    pub id: Uuid,
    pub name: String,
    pub created_at_utc: DateTime<Utc>,
}

/// A driver. Not tied to a single series; drivers run multiple series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub created_at_utc: DateTime<Utc>,
}

/// A free-form tag label applied to notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub label: String,
    pub created_at_utc: DateTime<Utc>,
}

// =============================================================================
// SESSIONS
// =============================================================================

/// Kind of on-track session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    Practice,
    Qualifying,
    Race,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Practice => "Practice",
            SessionKind::Qualifying => "Qualifying",
            SessionKind::Race => "Race",
        }
    }

    pub fn parse(s: &str) -> Option<SessionKind> {
        match s {
            "Practice" => Some(SessionKind::Practice),
            "Qualifying" => Some(SessionKind::Qualifying),
            "Race" => Some(SessionKind::Race),
            _ => None,
        }
    }
}

/// An on-track session at a track for a series on a date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub date: NaiveDate,
    pub kind: SessionKind,
    pub track_id: Uuid,
    pub series_id: Uuid,
    pub created_at_utc: DateTime<Utc>,
}

/// Context used to find or create a session during note creation.
///
/// When the submitting UI only knows "where we are" (track/series names,
/// session kind, date), the gateway resolves this to a session row,
/// creating track, series, and session rows as needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub track_name: String,
    pub series_name: String,
    pub kind: SessionKind,
    pub date: NaiveDate,
}

/// Reference to the session a note belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionRef {
    /// An already-known session row.
    Existing(Uuid),
    /// Find-or-create from context at submission time.
    Context(SessionContext),
}

// =============================================================================
// MEDIA
// =============================================================================

/// Kind of media attached to a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
    Csv,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
            MediaKind::Csv => "csv",
        }
    }

    pub fn parse(s: &str) -> Option<MediaKind> {
        match s {
            "video" => Some(MediaKind::Video),
            "image" => Some(MediaKind::Image),
            "csv" => Some(MediaKind::Csv),
            _ => None,
        }
    }

    /// Classify a filename by extension. Unrecognized extensions fall back
    /// to `Video`, matching the upload paths the desktop app accepts.
    pub fn from_extension(filename: &str) -> MediaKind {
        let ext = filename
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" => MediaKind::Image,
            "csv" | "xlsx" | "xls" => MediaKind::Csv,
            _ => MediaKind::Video,
        }
    }
}

/// A stored media file owned by exactly one note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub id: Uuid,
    pub note_id: Uuid,
    pub file_url: String,
    pub kind: MediaKind,
    pub size_mb: Option<f64>,
    pub filename: Option<String>,
    pub created_at_utc: DateTime<Utc>,
}

/// Media reference carried inside note requests and feed rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub file_url: String,
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_mb: Option<f64>,
}

// =============================================================================
// NOTES
// =============================================================================

/// Note category: what the note is primarily about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteCategory {
    General,
    Track,
    Series,
    Driver,
}

impl NoteCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteCategory::General => "General",
            NoteCategory::Track => "Track",
            NoteCategory::Series => "Series",
            NoteCategory::Driver => "Driver",
        }
    }

    pub fn parse(s: &str) -> Option<NoteCategory> {
        match s {
            "General" => Some(NoteCategory::General),
            "Track" => Some(NoteCategory::Track),
            "Series" => Some(NoteCategory::Series),
            "Driver" => Some(NoteCategory::Driver),
            _ => None,
        }
    }
}

impl Default for NoteCategory {
    fn default() -> Self {
        NoteCategory::General
    }
}

/// A note row as stored remotely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub body: String,
    pub shared: bool,
    pub category: NoteCategory,
    pub created_by: String,
    pub driver_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// Denormalized feed row: note joined with its session, track, series,
/// driver, tag labels, and media references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteView {
    pub id: Uuid,
    pub body: String,
    pub shared: bool,
    pub category: NoteCategory,
    pub created_by: String,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
    pub driver_name: Option<String>,
    pub session_date: Option<NaiveDate>,
    pub session_kind: Option<SessionKind>,
    pub track_name: Option<String>,
    pub track_type: Option<TrackType>,
    pub series_name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub media: Vec<MediaInfo>,
}

/// Request to create a note, with everything the gateway needs to write
/// the note row, its tag associations, and its media rows in one unit.
///
/// This is also the payload persisted in the local outbox when the remote
/// backend is unreachable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub body: String,
    #[serde(default = "default_shared")]
    pub shared: bool,
    #[serde(default)]
    pub category: NoteCategory,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionRef>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub media: Vec<MediaInfo>,
}

fn default_shared() -> bool {
    true
}

/// Optional filters for the note feed.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub track_ids: Vec<Uuid>,
    pub series_ids: Vec<Uuid>,
    pub driver_ids: Vec<Uuid>,
    /// Tag labels; a note matches when it carries any of them.
    pub tags: Vec<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search_text: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// =============================================================================
// REFERENCE DATA SETS
// =============================================================================

/// Kinds of read-mostly reference data the core caches locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Track,
    Series,
    Driver,
    Tag,
}

impl ReferenceKind {
    /// All reference kinds, in cache-refresh order.
    pub const ALL: [ReferenceKind; 4] = [
        ReferenceKind::Track,
        ReferenceKind::Series,
        ReferenceKind::Driver,
        ReferenceKind::Tag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Track => "track",
            ReferenceKind::Series => "series",
            ReferenceKind::Driver => "driver",
            ReferenceKind::Tag => "tag",
        }
    }
}

/// A typed set of reference rows for one kind.
///
/// Rows from the hosted query layer are validated into these variants at
/// the gateway boundary; nothing duck-typed enters the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReferenceSet {
    Tracks(Vec<Track>),
    Series(Vec<Series>),
    Drivers(Vec<Driver>),
    Tags(Vec<Tag>),
}

impl ReferenceSet {
    /// Empty set for a kind. A missing cache is a degraded result, not an
    /// error, so this is what first-run offline reads produce.
    pub fn empty(kind: ReferenceKind) -> ReferenceSet {
        match kind {
            ReferenceKind::Track => ReferenceSet::Tracks(Vec::new()),
            ReferenceKind::Series => ReferenceSet::Series(Vec::new()),
            ReferenceKind::Driver => ReferenceSet::Drivers(Vec::new()),
            ReferenceKind::Tag => ReferenceSet::Tags(Vec::new()),
        }
    }

    pub fn kind(&self) -> ReferenceKind {
        match self {
            ReferenceSet::Tracks(_) => ReferenceKind::Track,
            ReferenceSet::Series(_) => ReferenceKind::Series,
            ReferenceSet::Drivers(_) => ReferenceKind::Driver,
            ReferenceSet::Tags(_) => ReferenceKind::Tag,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ReferenceSet::Tracks(v) => v.len(),
            ReferenceSet::Series(v) => v.len(),
            ReferenceSet::Drivers(v) => v.len(),
            ReferenceSet::Tags(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// LOCAL OUTBOX
// =============================================================================

/// A note-creation request persisted locally, awaiting successful remote
/// application. Has no remote identifier until it is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingWrite {
    /// Monotonic local sequence number; drain order is ascending sequence.
    pub sequence: u64,
    pub queued_at_utc: DateTime<Utc>,
    pub request: CreateNoteRequest,
}

// =============================================================================
// CORE-TO-UI OUTCOMES
// =============================================================================

/// Outcome of a note submission.
///
/// `Queued` is a successful-but-deferred outcome, not an error; the UI
/// must render it distinctly ("saved, will sync when online").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Applied remotely; carries the identifier assigned by the remote store.
    Synced(Uuid),
    /// Persisted in the local outbox; carries the local sequence number.
    Queued(u64),
}

/// Outcome of a read that can fall back to the local cache.
#[derive(Debug, Clone)]
pub enum ReadOutcome<T> {
    /// Fresh from the remote store.
    Fresh(T),
    /// Last-known-good from the local cache; possibly out of date.
    Cached(T),
}

impl<T> ReadOutcome<T> {
    pub fn value(&self) -> &T {
        match self {
            ReadOutcome::Fresh(v) | ReadOutcome::Cached(v) => v,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            ReadOutcome::Fresh(v) | ReadOutcome::Cached(v) => v,
        }
    }

    /// True when the value came from the cache and should be flagged as
    /// possibly out of date.
    pub fn is_cached(&self) -> bool {
        matches!(self, ReadOutcome::Cached(_))
    }
}

/// Connectivity mode owned by the sync coordinator.
///
/// Advisory, not authoritative: every operation still attempts the remote
/// gateway first regardless of this flag. UI reads it, never sets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Online,
    Degraded,
}
