//! Artifact row CRUD: insert, get, update, delete, list.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::path::{Path, PathBuf};

use super::db::{unix_timestamp, CacheDb};
use super::types::{ArtifactId, CachedArtifact};
use crate::error::Result;

fn artifact_from_row(row: &SqliteRow) -> CachedArtifact {
    let local_path: String = row.get("local_path");
    let extraction_path: Option<String> = row.get("extraction_path");
    CachedArtifact {
        id: row.get("id"),
        url: row.get("url"),
        local_path: PathBuf::from(local_path),
        extraction_path: extraction_path.map(PathBuf::from),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLUMNS: &str = "id, url, local_path, extraction_path, created_at, updated_at";

impl CacheDb {
    /// Insert a new row for `url`. Fails if the url already has one (the
    /// unique index on `url` enforces one record per identifier).
    pub(super) async fn insert(&self, url: &str, local_path: &Path) -> Result<CachedArtifact> {
        let now = unix_timestamp();
        let id = sqlx::query(
            r#"
            INSERT INTO artifacts (url, local_path, extraction_path, created_at, updated_at)
            VALUES (?1, ?2, NULL, ?3, ?4)
            "#,
        )
        .bind(url)
        .bind(local_path.to_string_lossy().as_ref())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(CachedArtifact {
            id,
            url: url.to_string(),
            local_path: local_path.to_path_buf(),
            extraction_path: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub(super) async fn get_by_url(&self, url: &str) -> Result<Option<CachedArtifact>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM artifacts WHERE url = ?1"
        ))
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(artifact_from_row))
    }

    pub(super) async fn get_by_id(&self, id: ArtifactId) -> Result<Option<CachedArtifact>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM artifacts WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(artifact_from_row))
    }

    /// Persist `local_path`/`extraction_path` and bump `updated_at`, writing
    /// the new timestamp back into `record`.
    pub(super) async fn update(&self, record: &mut CachedArtifact) -> Result<()> {
        let now = unix_timestamp();
        sqlx::query(
            r#"
            UPDATE artifacts
            SET local_path = ?1,
                extraction_path = ?2,
                updated_at = ?3
            WHERE id = ?4
            "#,
        )
        .bind(record.local_path.to_string_lossy().as_ref())
        .bind(
            record
                .extraction_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
        )
        .bind(now)
        .bind(record.id)
        .execute(&self.pool)
        .await?;

        record.updated_at = now;
        Ok(())
    }

    pub(super) async fn delete(&self, id: ArtifactId) -> Result<()> {
        sqlx::query("DELETE FROM artifacts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub(super) async fn list(&self) -> Result<Vec<CachedArtifact>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM artifacts ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(artifact_from_row).collect())
    }
}
