//! Media repository: rows in the `media` table, each owned by one note.

use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use racenotes_core::{Error, Media, MediaInfo, MediaKind, Result};

/// PostgreSQL implementation of the media repository.
pub struct PgMediaRepository {
    pool: Pool<Postgres>,
}

impl PgMediaRepository {
    /// Create a new PgMediaRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Record a media row for an already-uploaded file.
    pub async fn insert(&self, note_id: Uuid, info: &MediaInfo) -> Result<Media> {
        let row = sqlx::query(
            "INSERT INTO media (note_id, file_url, kind, size_mb, filename)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, note_id, file_url, kind, size_mb, filename, created_at_utc",
        )
        .bind(note_id)
        .bind(&info.file_url)
        .bind(info.kind.as_str())
        .bind(info.size_mb)
        .bind(&info.filename)
        .fetch_one(&self.pool)
        .await?;

        map_media_row(row)
    }

    /// All media rows for a note, oldest first.
    pub async fn list_for_note(&self, note_id: Uuid) -> Result<Vec<Media>> {
        let rows = sqlx::query(
            "SELECT id, note_id, file_url, kind, size_mb, filename, created_at_utc
             FROM media WHERE note_id = $1 ORDER BY created_at_utc",
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_media_row).collect()
    }
}

fn map_media_row(row: PgRow) -> Result<Media> {
    let raw: String = row.get("kind");
    let kind = MediaKind::parse(&raw)
        .ok_or_else(|| Error::Serialization(format!("unknown media kind: {raw}")))?;

    Ok(Media {
        id: row.get("id"),
        note_id: row.get("note_id"),
        file_url: row.get("file_url"),
        kind,
        size_mb: row.get("size_mb"),
        filename: row.get("filename"),
        created_at_utc: row.get("created_at_utc"),
    })
}
