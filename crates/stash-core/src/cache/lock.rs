//! Cross-process exclusive lock over the store (flock on a lock file).
//!
//! Every process pointed at the same cache root contends on the same file,
//! so the lookup-download-extract-update sequence is serialized across
//! processes as well as threads. Wait policy: block indefinitely unless a
//! timeout is configured, in which case acquisition polls non-blocking and
//! fails with `Error::Lock` once the deadline passes.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// RAII guard for the store lock. Dropping it releases the lock on every
/// exit path (normal return, error, cancellation).
#[derive(Debug)]
pub struct StoreLock {
    // Closing the file descriptor releases the flock.
    _file: File,
}

/// Acquire the lock at `lock_path`. The blocking flock runs on the blocking
/// pool so callers inside the runtime don't stall other tasks.
pub(super) async fn acquire(lock_path: &Path, timeout: Option<Duration>) -> Result<StoreLock> {
    let lock_path = lock_path.to_path_buf();
    tokio::task::spawn_blocking(move || acquire_blocking(&lock_path, timeout))
        .await
        .map_err(|e| Error::Lock(format!("lock task failed: {e}")))?
}

fn acquire_blocking(lock_path: &Path, timeout: Option<Duration>) -> Result<StoreLock> {
    let file = File::options()
        .create(true)
        .write(true)
        .open(lock_path)
        .map_err(|e| Error::Lock(format!("cannot open {}: {e}", lock_path.display())))?;

    flock_exclusive(&file, timeout)?;
    Ok(StoreLock { _file: file })
}

#[cfg(unix)]
fn flock_exclusive(file: &File, timeout: Option<Duration>) -> Result<()> {
    use std::os::unix::io::AsRawFd;
    use std::time::Instant;

    let fd = file.as_raw_fd();
    match timeout {
        None => loop {
            let r = unsafe { libc::flock(fd, libc::LOCK_EX) };
            if r == 0 {
                return Ok(());
            }
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            return Err(Error::Lock(format!("flock failed: {err}")));
        },
        Some(timeout) => {
            let deadline = Instant::now() + timeout;
            loop {
                let r = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
                if r == 0 {
                    return Ok(());
                }
                let err = std::io::Error::last_os_error();
                match err.raw_os_error() {
                    Some(libc::EWOULDBLOCK) | Some(libc::EINTR) => {
                        if Instant::now() >= deadline {
                            return Err(Error::Lock(format!(
                                "store lock not acquired within {timeout:?}"
                            )));
                        }
                        std::thread::sleep(Duration::from_millis(50));
                    }
                    _ => return Err(Error::Lock(format!("flock failed: {err}"))),
                }
            }
        }
    }
}

/// Stub for non-Unix: no cross-process exclusion, in-process callers only.
#[cfg(not(unix))]
fn flock_exclusive(_file: &File, _timeout: Option<Duration>) -> Result<()> {
    Ok(())
}
