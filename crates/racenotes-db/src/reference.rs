//! Reference-data repository: tracks, series, drivers, tags.
//!
//! Rows coming back from Postgres are validated into the typed
//! `ReferenceSet` variants here, at the boundary; enum columns that fail
//! to parse are a serialization error, not a silent default.

use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

use racenotes_core::{
    Driver, Error, ReferenceKind, ReferenceSet, Result, Series, Tag, Track, TrackType,
};

/// PostgreSQL repository for reference entities.
pub struct PgReferenceRepository {
    pool: Pool<Postgres>,
}

impl PgReferenceRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Fetch current rows for the given kind, ordered by name/label.
    pub async fn fetch(&self, kind: ReferenceKind) -> Result<ReferenceSet> {
        match kind {
            ReferenceKind::Track => self.fetch_tracks().await,
            ReferenceKind::Series => self.fetch_series().await,
            ReferenceKind::Driver => self.fetch_drivers().await,
            ReferenceKind::Tag => self.fetch_tags().await,
        }
    }

    async fn fetch_tracks(&self) -> Result<ReferenceSet> {
        let rows =
            sqlx::query("SELECT id, name, track_type, created_at_utc FROM track ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        let tracks = rows
            .into_iter()
            .map(|row| {
                let raw: String = row.get("track_type");
                let track_type = TrackType::parse(&raw).ok_or_else(|| {
                    Error::Serialization(format!("unknown track type: {raw}"))
                })?;
                Ok(Track {
                    id: row.get("id"),
                    name: row.get("name"),
                    track_type,
                    created_at_utc: row.get("created_at_utc"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ReferenceSet::Tracks(tracks))
    }

    async fn fetch_series(&self) -> Result<ReferenceSet> {
        let rows = sqlx::query("SELECT id, name, created_at_utc FROM series ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        let series = rows
            .into_iter()
            .map(|row| Series {
                id: row.get("id"),
                name: row.get("name"),
                created_at_utc: row.get("created_at_utc"),
            })
            .collect();

        Ok(ReferenceSet::Series(series))
    }

    async fn fetch_drivers(&self) -> Result<ReferenceSet> {
        let rows = sqlx::query("SELECT id, name, created_at_utc FROM driver ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        let drivers = rows
            .into_iter()
            .map(|row| Driver {
                id: row.get("id"),
                name: row.get("name"),
                created_at_utc: row.get("created_at_utc"),
            })
            .collect();

        Ok(ReferenceSet::Drivers(drivers))
    }

    async fn fetch_tags(&self) -> Result<ReferenceSet> {
        let rows = sqlx::query("SELECT id, label, created_at_utc FROM tag ORDER BY label")
            .fetch_all(&self.pool)
            .await?;

        let tags = rows
            .into_iter()
            .map(|row| Tag {
                id: row.get("id"),
                label: row.get("label"),
                created_at_utc: row.get("created_at_utc"),
            })
            .collect();

        Ok(ReferenceSet::Tags(tags))
    }
}

/// Validate a tag label before it reaches the remote store.
///
/// Rules: 1-100 characters, no leading/trailing whitespace.
pub fn validate_tag_label(label: &str) -> std::result::Result<(), String> {
    if label.is_empty() {
        return Err("Tag label cannot be empty".to_string());
    }
    if label.len() > 100 {
        return Err("Tag label must be 100 characters or less".to_string());
    }
    if label.trim() != label {
        return Err("Tag label cannot have leading or trailing whitespace".to_string());
    }
    Ok(())
}

// =============================================================================
// TRANSACTION-SCOPED FIND-OR-CREATE HELPERS
// =============================================================================
// Used inside the note-creation transaction so a note and the reference
// rows it introduces commit as one unit.

/// Find a track by name, creating it when absent. New tracks default to
/// Road Course until someone classifies them.
pub async fn find_or_create_track(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
) -> Result<Uuid> {
    let row = sqlx::query(
        "INSERT INTO track (name, track_type) VALUES ($1, $2)
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
         RETURNING id",
    )
    .bind(name)
    .bind(TrackType::RoadCourse.as_str())
    .fetch_one(&mut **tx)
    .await?;
    Ok(row.get("id"))
}

/// Find a series by name, creating it when absent.
pub async fn find_or_create_series(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
) -> Result<Uuid> {
    let row = sqlx::query(
        "INSERT INTO series (name) VALUES ($1)
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
         RETURNING id",
    )
    .bind(name)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row.get("id"))
}

/// Find a tag by label, creating it when absent.
pub async fn find_or_create_tag(
    tx: &mut Transaction<'_, Postgres>,
    label: &str,
) -> Result<Uuid> {
    validate_tag_label(label).map_err(Error::InvalidInput)?;

    let row = sqlx::query(
        "INSERT INTO tag (label) VALUES ($1)
         ON CONFLICT (label) DO UPDATE SET label = EXCLUDED.label
         RETURNING id",
    )
    .bind(label)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row.get("id"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tag_label_ok() {
        assert!(validate_tag_label("setup").is_ok());
        assert!(validate_tag_label("tire wear").is_ok());
    }

    #[test]
    fn test_validate_tag_label_rejects_empty() {
        assert!(validate_tag_label("").is_err());
    }

    #[test]
    fn test_validate_tag_label_rejects_whitespace_padding() {
        assert!(validate_tag_label(" setup").is_err());
        assert!(validate_tag_label("setup ").is_err());
    }

    #[test]
    fn test_validate_tag_label_rejects_overlong() {
        let long = "x".repeat(101);
        assert!(validate_tag_label(&long).is_err());
    }
}
