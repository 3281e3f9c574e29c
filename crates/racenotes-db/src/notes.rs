//! Note repository implementation.

use sqlx::{postgres::PgRow, Pool, Postgres, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

use racenotes_core::defaults::FEED_LIMIT;
use racenotes_core::{
    CreateNoteRequest, Error, MediaInfo, NoteCategory, NoteFilter, NoteView, Result,
    SessionContext, SessionKind, SessionRef, TrackType,
};

use crate::escape_like;
use crate::reference::{find_or_create_series, find_or_create_tag, find_or_create_track};

/// PostgreSQL implementation of the note repository.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a note plus its tag associations and media rows in one
    /// transaction. Returns the identifier assigned by the database.
    pub async fn insert(&self, req: CreateNoteRequest) -> Result<Uuid> {
        if req.body.trim().is_empty() {
            return Err(Error::InvalidInput("note body cannot be empty".into()));
        }

        let mut tx = self.pool.begin().await?;

        let session_id = match &req.session {
            Some(SessionRef::Existing(id)) => Some(*id),
            Some(SessionRef::Context(ctx)) => Some(find_or_create_session(&mut tx, ctx).await?),
            None => None,
        };

        let row = sqlx::query(
            "INSERT INTO note (body, shared, category, created_by, driver_id, session_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(&req.body)
        .bind(req.shared)
        .bind(req.category.as_str())
        .bind(&req.created_by)
        .bind(req.driver_id)
        .bind(session_id)
        .fetch_one(&mut *tx)
        .await?;
        let note_id: Uuid = row.get("id");

        for label in &req.tags {
            let tag_id = find_or_create_tag(&mut tx, label).await?;
            sqlx::query(
                "INSERT INTO note_tag (note_id, tag_id) VALUES ($1, $2)
                 ON CONFLICT (note_id, tag_id) DO NOTHING",
            )
            .bind(note_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
        }

        for media in &req.media {
            sqlx::query(
                "INSERT INTO media (note_id, file_url, kind, size_mb, filename)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(note_id)
            .bind(&media.file_url)
            .bind(media.kind.as_str())
            .bind(media.size_mb)
            .bind(&media.filename)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(
            subsystem = "db",
            component = "notes",
            op = "insert",
            note_id = %note_id,
            tag_count = req.tags.len(),
            media_count = req.media.len(),
            "Note inserted"
        );
        Ok(note_id)
    }

    /// Fetch the denormalized feed, newest first, applying optional filters.
    pub async fn feed(&self, filter: NoteFilter) -> Result<Vec<NoteView>> {
        let mut sql = String::from(
            "SELECT id, body, shared, category, created_by, created_at_utc, updated_at_utc,
                    driver_name, session_date, session_kind, track_name, track_type,
                    series_name, tags, media
             FROM note_feed WHERE true ",
        );

        let mut idx = 1usize;
        if !filter.track_ids.is_empty() {
            sql.push_str(&format!("AND track_id = ANY(${idx}) "));
            idx += 1;
        }
        if !filter.series_ids.is_empty() {
            sql.push_str(&format!("AND series_id = ANY(${idx}) "));
            idx += 1;
        }
        if !filter.driver_ids.is_empty() {
            sql.push_str(&format!("AND driver_id = ANY(${idx}) "));
            idx += 1;
        }
        if !filter.tags.is_empty() {
            sql.push_str(&format!("AND tags && ${idx} "));
            idx += 1;
        }
        if filter.date_from.is_some() {
            sql.push_str(&format!("AND session_date >= ${idx} "));
            idx += 1;
        }
        if filter.date_to.is_some() {
            sql.push_str(&format!("AND session_date <= ${idx} "));
            idx += 1;
        }
        if filter.search_text.is_some() {
            sql.push_str(&format!("AND body ILIKE ${idx} ESCAPE '\\' "));
            idx += 1;
        }
        sql.push_str(&format!(
            "ORDER BY created_at_utc DESC LIMIT ${idx} OFFSET ${}",
            idx + 1
        ));

        let mut query = sqlx::query(&sql);
        if !filter.track_ids.is_empty() {
            query = query.bind(filter.track_ids.clone());
        }
        if !filter.series_ids.is_empty() {
            query = query.bind(filter.series_ids.clone());
        }
        if !filter.driver_ids.is_empty() {
            query = query.bind(filter.driver_ids.clone());
        }
        if !filter.tags.is_empty() {
            query = query.bind(filter.tags.clone());
        }
        if let Some(d) = filter.date_from {
            query = query.bind(d);
        }
        if let Some(d) = filter.date_to {
            query = query.bind(d);
        }
        if let Some(text) = &filter.search_text {
            query = query.bind(format!("%{}%", escape_like(text)));
        }
        query = query
            .bind(filter.limit.unwrap_or(FEED_LIMIT))
            .bind(filter.offset.unwrap_or(0));

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(map_feed_row).collect()
    }

    /// Delete a note. Media rows and tag associations go with it via
    /// ON DELETE CASCADE.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("note {id}")));
        }
        Ok(())
    }
}

/// Map a `note_feed` row into a validated NoteView.
fn map_feed_row(row: PgRow) -> Result<NoteView> {
    let category_raw: String = row.get("category");
    let category = NoteCategory::parse(&category_raw)
        .ok_or_else(|| Error::Serialization(format!("unknown note category: {category_raw}")))?;

    let session_kind = row
        .get::<Option<String>, _>("session_kind")
        .map(|raw| {
            SessionKind::parse(&raw)
                .ok_or_else(|| Error::Serialization(format!("unknown session kind: {raw}")))
        })
        .transpose()?;

    let track_type = row
        .get::<Option<String>, _>("track_type")
        .map(|raw| {
            TrackType::parse(&raw)
                .ok_or_else(|| Error::Serialization(format!("unknown track type: {raw}")))
        })
        .transpose()?;

    let media: Vec<MediaInfo> =
        serde_json::from_value(row.get::<serde_json::Value, _>("media"))?;

    Ok(NoteView {
        id: row.get("id"),
        body: row.get("body"),
        shared: row.get("shared"),
        category,
        created_by: row.get("created_by"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
        driver_name: row.get("driver_name"),
        session_date: row.get("session_date"),
        session_kind,
        track_name: row.get("track_name"),
        track_type,
        series_name: row.get("series_name"),
        tags: row.get("tags"),
        media,
    })
}

/// Resolve a session context to a session row inside the note-creation
/// transaction, creating track, series, and session rows as needed.
pub async fn find_or_create_session(
    tx: &mut Transaction<'_, Postgres>,
    ctx: &SessionContext,
) -> Result<Uuid> {
    let track_id = find_or_create_track(tx, &ctx.track_name).await?;
    let series_id = find_or_create_series(tx, &ctx.series_name).await?;

    let row = sqlx::query(
        "INSERT INTO session (date, kind, track_id, series_id)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (date, kind, track_id, series_id) DO UPDATE SET date = EXCLUDED.date
         RETURNING id",
    )
    .bind(ctx.date)
    .bind(ctx.kind.as_str())
    .bind(track_id)
    .bind(series_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row.get("id"))
}
