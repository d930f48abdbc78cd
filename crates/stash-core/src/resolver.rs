//! The resolution engine: identifier + flags -> guaranteed-existing local path.
//!
//! Handles nested `outer!inner` references, the local-path fast path, and
//! the locked download/extract/update pipeline with transactional rollback:
//! on any failure (or cancellation) no partial artifact or extraction dir is
//! left on disk, and the error propagates unchanged.

use std::ffi::OsString;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use crate::archive;
use crate::cache::{ArtifactId, Cache, CachedArtifact};
use crate::config::StashConfig;
use crate::error::{Error, Result};
use crate::reference;
use crate::transport::{self, OpenMode};

/// Flags steering a single resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Extract the artifact if it is an archive and return the extraction
    /// dir. Silent no-op on non-archives.
    pub extract: bool,
    /// Re-download even if the artifact is present and fresh.
    pub force_download: bool,
    /// Re-extract, discarding any previous extraction dir.
    pub force_extract: bool,
}

/// Options for `Resolver::open`.
///
/// Cache participation by mode:
///
/// | mode   | use_cache | behavior                                       |
/// |--------|-----------|------------------------------------------------|
/// | Read   | true      | resolve through the cache, open result         |
/// | Read   | false     | local: open directly; remote: fetch to a       |
/// |        |           | private temp file, no cache record             |
/// | Write  | any       | bypass cache, create/truncate directly         |
/// | Append | any       | bypass cache, append directly                  |
///
/// Writable modes require a local target; http is read-only here.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOptions {
    pub mode: OpenMode,
    pub use_cache: bool,
    pub extract: bool,
    pub force_download: bool,
    pub force_extract: bool,
}

impl OpenOptions {
    pub fn read_cached() -> Self {
        OpenOptions {
            mode: OpenMode::Read,
            use_cache: true,
            ..Default::default()
        }
    }

    fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            extract: self.extract,
            force_download: self.force_download,
            force_extract: self.force_extract,
        }
    }
}

/// Key for removal: a record id or the original identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKey {
    Id(ArtifactId),
    Url(String),
}

impl ArtifactKey {
    /// Interpret a CLI argument: all-digits means an id, anything else a url.
    pub fn parse(s: &str) -> Self {
        match s.parse::<ArtifactId>() {
            Ok(id) => ArtifactKey::Id(id),
            Err(_) => ArtifactKey::Url(s.to_string()),
        }
    }
}

/// Orchestrates identifier parsing, recursion into nested archives, and the
/// download/extract/update/rollback pipeline over one `Cache`.
#[derive(Clone)]
pub struct Resolver {
    cache: Cache,
}

impl Resolver {
    pub fn new(cache: Cache) -> Self {
        Resolver { cache }
    }

    /// Open the cache described by `config` and wrap it in a resolver.
    pub async fn from_config(config: &StashConfig) -> anyhow::Result<Self> {
        Ok(Resolver::new(Cache::open(config).await?))
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Resolve `identifier` to a local path per the flags. See the module
    /// docs for the decision policy.
    pub async fn cached_path(&self, identifier: &str, opts: ResolveOptions) -> Result<PathBuf> {
        self.cached_path_inner(identifier.to_string(), opts).await
    }

    // Boxed for recursion: the outer part of a nested reference is itself
    // resolved through this same entry point.
    fn cached_path_inner(
        &self,
        identifier: String,
        opts: ResolveOptions,
    ) -> Pin<Box<dyn Future<Output = Result<PathBuf>> + Send + '_>> {
        Box::pin(async move {
            // Nested `outer!inner`: resolve the outer with extraction
            // implied, then select the inner path inside the result.
            if let Some((outer, inner)) = reference::split_nested(&identifier) {
                let dir = self
                    .cached_path_inner(
                        outer.to_string(),
                        ResolveOptions {
                            extract: true,
                            ..opts
                        },
                    )
                    .await?;
                if !dir.is_dir() {
                    return Err(Error::InvalidReference(format!(
                        "{identifier:?} uses the {:?} syntax, but the outer part is not an archive",
                        reference::NESTED_SEPARATOR
                    )));
                }
                let inner = reference::normalize_inner_path(inner)?;
                return Ok(dir.join(inner));
            }

            // Existing local non-archive without extraction: returned as-is,
            // no locking, no caching.
            let identifier = if reference::is_local(&identifier) {
                let path = reference::local_path(&identifier);
                if !opts.extract && !archive::is_archive_file(&path) && path.exists() {
                    return Ok(path);
                }
                path.to_string_lossy().into_owned()
            } else {
                identifier
            };

            self.resolve_pipeline(&identifier, opts).await
        })
    }

    /// The locked lookup-download-extract-update sequence.
    async fn resolve_pipeline(&self, identifier: &str, opts: ResolveOptions) -> Result<PathBuf> {
        // The lock is declared before the rollback guard so cleanup runs
        // while the critical section is still held.
        let _lock = self.cache.lock().await?;

        let mut record = if self.cache.contains(identifier).await? {
            self.cache.by_url(identifier).await?
        } else {
            self.cache.add(identifier).await?
        };

        let cleanup = RollbackGuard::new(&record.local_path);
        let path = self.run_steps(&mut record, opts).await?;
        cleanup.disarm();
        Ok(path)
    }

    async fn run_steps(
        &self,
        record: &mut CachedArtifact,
        opts: ResolveOptions,
    ) -> Result<PathBuf> {
        let mut downloaded = false;
        if !record.local_path.exists() || self.cache.is_expired(record) || opts.force_download {
            tracing::info!(url = %record.url, dest = %record.local_path.display(), "downloading");
            transport::download(&record.url, &record.local_path).await?;
            downloaded = true;
        }

        let mut extracted = false;
        if archive::is_archive_file(&record.local_path)
            && ((opts.extract && record.extraction_path.is_none())
                || (downloaded && record.extraction_path.is_some())
                || opts.force_extract)
        {
            let dest = extraction_dir(&record.local_path);
            remove_path(&dest).await?;
            tracing::info!(archive = %record.local_path.display(), dest = %dest.display(), "extracting");
            let (archive_path, extract_dest) = (record.local_path.clone(), dest.clone());
            tokio::task::spawn_blocking(move || archive::extract(&archive_path, &extract_dest))
                .await
                .map_err(|e| Error::Io(io::Error::other(e)))??;
            record.extraction_path = Some(dest);
            extracted = true;
        }

        if downloaded || extracted {
            self.cache.update(record).await?;
        }

        if opts.extract || opts.force_extract {
            if let Some(extraction_path) = &record.extraction_path {
                return Ok(extraction_path.clone());
            }
        }
        Ok(record.local_path.clone())
    }

    /// Uncached pass-through to the transport.
    pub async fn download(url: &str, dest: &Path) -> Result<()> {
        transport::download(url, dest).await
    }

    /// Uncached pass-through to the transport.
    pub async fn upload(src: &Path, url: &str) -> Result<()> {
        transport::upload(src, url).await
    }

    /// Delete the artifact file and extraction dir (idempotently), then the
    /// metadata record. Fails with `NotFound` for an unknown key.
    pub async fn remove(&self, key: &ArtifactKey) -> Result<()> {
        let _lock = self.cache.lock().await?;
        let record = match key {
            ArtifactKey::Id(id) => self.cache.by_id(*id).await?,
            ArtifactKey::Url(url) => self.cache.by_url(url).await?,
        };

        remove_path(&record.local_path).await?;
        remove_path(&transport::part_path(&record.local_path)).await?;
        if let Some(extraction_path) = &record.extraction_path {
            remove_path(extraction_path).await?;
        }
        self.cache.delete(&record).await?;
        tracing::info!(url = %record.url, id = record.id, "removed cached artifact");
        Ok(())
    }

    /// Open an identifier as a file. `Read` with `use_cache` routes through
    /// `cached_path`; an uncached `Read` of a remote resource fetches into a
    /// private temp file; writable modes operate directly on a local target
    /// (see the table on [`OpenOptions`]).
    pub async fn open(&self, identifier: &str, opts: OpenOptions) -> Result<tokio::fs::File> {
        if opts.mode == OpenMode::Read {
            if opts.use_cache {
                let target = self.cached_path(identifier, opts.resolve_options()).await?;
                return transport::open_local(&target, OpenMode::Read).await;
            }
            if !reference::is_local(identifier) {
                return transport::open_remote_read(identifier).await;
            }
            return transport::open_local(&reference::local_path(identifier), OpenMode::Read).await;
        }

        if !reference::is_local(identifier) {
            return Err(Error::transport(
                identifier,
                io::Error::new(
                    io::ErrorKind::Unsupported,
                    "writable access requires a local target",
                ),
            ));
        }
        transport::open_local(&reference::local_path(identifier), opts.mode).await
    }
}

/// Deterministic extraction directory for an artifact (`x` -> `x-extracted`).
pub fn extraction_dir(local_path: &Path) -> PathBuf {
    let mut os: OsString = local_path.as_os_str().to_owned();
    os.push("-extracted");
    PathBuf::from(os)
}

/// Remove a file or directory tree, tolerating an already-missing target.
async fn remove_path(path: &Path) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
        Ok(meta) => {
            if meta.is_dir() {
                tokio::fs::remove_dir_all(path).await?;
            } else {
                tokio::fs::remove_file(path).await?;
            }
            Ok(())
        }
    }
}

fn remove_path_sync(path: &Path) {
    let result = match std::fs::metadata(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => return,
        Err(e) => Err(e),
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
    };
    if let Err(e) = result {
        tracing::warn!(path = %path.display(), "rollback cleanup failed: {}", e);
    }
}

/// Guaranteed-cleanup scope for the pipeline: while armed, dropping it
/// deletes the artifact file, its in-flight `.part` file, and the extraction
/// dir. Armed until the pipeline completes, so errors *and* cancellation
/// between lookup and update both roll back to a never-downloaded state.
struct RollbackGuard {
    local_path: PathBuf,
    armed: bool,
}

impl RollbackGuard {
    fn new(local_path: &Path) -> Self {
        RollbackGuard {
            local_path: local_path.to_path_buf(),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RollbackGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        remove_path_sync(&self.local_path);
        remove_path_sync(&transport::part_path(&self.local_path));
        remove_path_sync(&extraction_dir(&self.local_path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_dir_is_suffixed() {
        assert_eq!(
            extraction_dir(Path::new("/cache/artifacts/abc")),
            PathBuf::from("/cache/artifacts/abc-extracted")
        );
    }

    #[test]
    fn artifact_key_parse() {
        assert_eq!(ArtifactKey::parse("42"), ArtifactKey::Id(42));
        assert_eq!(
            ArtifactKey::parse("https://example.com/a"),
            ArtifactKey::Url("https://example.com/a".to_string())
        );
    }

    #[test]
    fn rollback_guard_cleans_when_armed() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("artifact");
        std::fs::write(&local, b"partial").unwrap();
        std::fs::create_dir_all(extraction_dir(&local)).unwrap();

        let guard = RollbackGuard::new(&local);
        drop(guard);
        assert!(!local.exists());
        assert!(!extraction_dir(&local).exists());
    }

    #[test]
    fn rollback_guard_keeps_files_when_disarmed() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("artifact");
        std::fs::write(&local, b"complete").unwrap();

        let guard = RollbackGuard::new(&local);
        guard.disarm();
        assert!(local.exists());
    }
}
