//! Persistent metadata store for cached artifacts (SQLite via sqlx).
//!
//! One row per distinct identifier ever resolved. The store also owns the
//! cross-process lock serializing every mutating resolve sequence and the
//! expiration policy driven by `updated_at`.

mod db;
mod key;
mod lock;
mod records;
mod types;

pub use lock::StoreLock;
pub use types::{ArtifactId, CachedArtifact};

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::StashConfig;
use crate::error::{Error, Result};
use db::CacheDb;

/// Handle to a cache root: artifact directory, metadata DB, and lock file.
///
/// Cheap to clone; clones share the same connection pool.
#[derive(Clone)]
pub struct Cache {
    artifact_dir: PathBuf,
    lock_path: PathBuf,
    db: CacheDb,
    expire_days: Option<u64>,
    lock_timeout: Option<Duration>,
}

impl Cache {
    /// Open (or create) the cache described by `config`.
    pub async fn open(config: &StashConfig) -> anyhow::Result<Self> {
        let root = config.cache_root()?;
        Ok(Self::open_at(&root, config.expire_days, config.lock_timeout_secs.map(Duration::from_secs)).await?)
    }

    /// Open (or create) a cache at a specific root directory. Intended for
    /// tests and for callers managing their own config.
    pub async fn open_at(
        root: &Path,
        expire_days: Option<u64>,
        lock_timeout: Option<Duration>,
    ) -> Result<Self> {
        let artifact_dir = root.join("artifacts");
        tokio::fs::create_dir_all(&artifact_dir).await?;
        let db = CacheDb::open_at(&root.join("cache.db")).await?;
        Ok(Cache {
            artifact_dir,
            lock_path: root.join("cache.lock"),
            db,
            expire_days,
            lock_timeout,
        })
    }

    /// Acquire the store's exclusive cross-process lock. Every mutating
    /// resolve sequence runs while holding the returned guard; dropping it
    /// releases the lock on any exit path.
    pub async fn lock(&self) -> Result<StoreLock> {
        lock::acquire(&self.lock_path, self.lock_timeout).await
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    pub async fn contains(&self, url: &str) -> Result<bool> {
        Ok(self.db.get_by_url(url).await?.is_some())
    }

    /// Fetch the record for `url`, failing with `NotFound` if absent.
    pub async fn by_url(&self, url: &str) -> Result<CachedArtifact> {
        self.db
            .get_by_url(url)
            .await?
            .ok_or_else(|| Error::NotFound(url.to_string()))
    }

    /// Fetch the record with the given id, failing with `NotFound` if absent.
    pub async fn by_id(&self, id: ArtifactId) -> Result<CachedArtifact> {
        self.db
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("id {id}")))
    }

    /// Create and persist a new record for `url` with its deterministic
    /// local path and no extraction path.
    pub async fn add(&self, url: &str) -> Result<CachedArtifact> {
        let local_path = self.artifact_dir.join(key::artifact_file_name(url));
        self.db.insert(url, &local_path).await
    }

    /// Persist a mutated record (local/extraction paths); bumps and writes
    /// back `updated_at`.
    pub async fn update(&self, record: &mut CachedArtifact) -> Result<()> {
        self.db.update(record).await
    }

    /// Delete the metadata row only; callers delete backing files separately.
    pub async fn delete(&self, record: &CachedArtifact) -> Result<()> {
        self.db.delete(record.id).await
    }

    /// Snapshot of all records, oldest id first.
    pub async fn list(&self) -> Result<Vec<CachedArtifact>> {
        self.db.list().await
    }

    /// Snapshot of all records currently past the expiration window.
    pub async fn list_expired(&self) -> Result<Vec<CachedArtifact>> {
        let all = self.db.list().await?;
        Ok(all.into_iter().filter(|r| self.is_expired(r)).collect())
    }

    /// False when no expiration window is configured; otherwise true iff
    /// `updated_at` is at least `expire_days` old.
    pub fn is_expired(&self, record: &CachedArtifact) -> bool {
        match self.expire_days {
            None => false,
            Some(days) => {
                let age = db::unix_timestamp() - record.updated_at;
                age >= days as i64 * 86_400
            }
        }
    }
}
