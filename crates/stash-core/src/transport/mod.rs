//! Byte transport keyed by URL scheme.
//!
//! `http`/`https` identifiers go through curl (see `http`); `file://` and
//! bare paths use the local filesystem. Uploads support local targets only;
//! http targets are read-only here.

mod http;

use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::reference;

/// Access mode for `open`. Replaces stringly modes with an explicit enum;
/// only `Read` ever participates in the cache (see the resolver's table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    #[default]
    Read,
    /// Create or truncate.
    Write,
    /// Create if missing, append at the end.
    Append,
}

/// Temp-file suffix used while a download is in flight; the finished file is
/// renamed into place so a partial body is never at the final path.
pub const PART_SUFFIX: &str = ".part";

/// Path of the in-flight temp file for `dest` (`x` -> `x.part`).
pub fn part_path(dest: &Path) -> PathBuf {
    let mut os = dest.as_os_str().to_owned();
    os.push(PART_SUFFIX);
    PathBuf::from(os)
}

/// Write the resource at `url_or_path` fully to `dest`, creating parent
/// directories. Remote failures, non-2xx statuses, and source-side IO all
/// surface as `Error::Transport`.
pub async fn download(url_or_path: &str, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    if reference::is_local(url_or_path) {
        let src = reference::local_path(url_or_path);
        tokio::fs::copy(&src, dest)
            .await
            .map_err(|e| Error::transport(url_or_path, e))?;
        return Ok(());
    }

    let url = url_or_path.to_string();
    let dest = dest.to_path_buf();
    spawn_transport(move || http::download_to(&url, &dest)).await
}

/// Copy a local file to `url_or_path`. Local targets only; http is a
/// read-only scheme for us.
pub async fn upload(src: &Path, url_or_path: &str) -> Result<()> {
    if !reference::is_local(url_or_path) {
        return Err(Error::transport(
            url_or_path,
            io::Error::new(io::ErrorKind::Unsupported, "uploads require a local target"),
        ));
    }
    let dest = reference::local_path(url_or_path);
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(src, &dest)
        .await
        .map_err(|e| Error::transport(url_or_path, e))?;
    Ok(())
}

/// Open a local path with the given mode.
pub async fn open_local(path: &Path, mode: OpenMode) -> Result<tokio::fs::File> {
    let file = match mode {
        OpenMode::Read => tokio::fs::File::open(path).await?,
        OpenMode::Write => {
            tokio::fs::File::options()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .await?
        }
        OpenMode::Append => {
            tokio::fs::File::options()
                .append(true)
                .create(true)
                .open(path)
                .await?
        }
    };
    Ok(file)
}

/// Read a remote resource without the cache: download it into a private
/// temp file and return a handle to it. The temp path is unlinked before
/// returning, so the bytes live only as long as the handle.
pub async fn open_remote_read(url: &str) -> Result<tokio::fs::File> {
    let tmp = tempfile::NamedTempFile::new().map_err(Error::Io)?;
    let path = tmp.into_temp_path();
    download(url, &path).await?;
    let file = open_local(&path, OpenMode::Read).await?;
    path.close().map_err(Error::Io)?;
    Ok(file)
}

/// Run a blocking transport closure on the blocking pool.
async fn spawn_transport<F>(f: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Io(io::Error::other(e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::SeekFrom;
    use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/tmp/abc")).to_string_lossy(),
            "/tmp/abc.part"
        );
    }

    #[tokio::test]
    async fn local_download_copies_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.txt");
        tokio::fs::write(&src, b"payload").await.unwrap();

        let dest = dir.path().join("nested/dest.txt");
        download(src.to_str().unwrap(), &dest).await.unwrap();
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn local_download_missing_source_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("dest.txt");
        let err = download("/definitely/not/here.bin", &dest).await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn upload_to_http_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.txt");
        tokio::fs::write(&src, b"x").await.unwrap();
        let err = upload(&src, "https://example.com/up").await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }

    #[tokio::test]
    async fn upload_local_copies() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.txt");
        tokio::fs::write(&src, b"up").await.unwrap();
        let dest = dir.path().join("out/dest.txt");
        upload(&src, dest.to_str().unwrap()).await.unwrap();
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"up");
    }

    #[tokio::test]
    async fn open_modes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");

        let mut w = open_local(&path, OpenMode::Write).await.unwrap();
        w.write_all(b"one").await.unwrap();
        w.flush().await.unwrap();
        drop(w);

        let mut a = open_local(&path, OpenMode::Append).await.unwrap();
        a.write_all(b"two").await.unwrap();
        a.flush().await.unwrap();
        drop(a);

        let mut r = open_local(&path, OpenMode::Read).await.unwrap();
        r.seek(SeekFrom::Start(0)).await.unwrap();
        let mut buf = String::new();
        r.read_to_string(&mut buf).await.unwrap();
        assert_eq!(buf, "onetwo");
    }
}
