//! Single-stream HTTP GET via curl, writing to a `.part` temp file and
//! renaming into place on success.

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

use super::part_path;

/// Download `url` fully to `dest`. Blocking; run on the blocking pool. The
/// body streams into `dest.part`, which is fsynced and renamed only after a
/// 2xx response completed, so no partial body ever sits at `dest`.
pub(super) fn download_to(url: &str, dest: &Path) -> Result<()> {
    let temp = part_path(dest);
    let result = fetch_to_temp(url, &temp).and_then(|()| {
        std::fs::rename(&temp, dest).map_err(|e| Error::transport(url, e))
    });
    if result.is_err() {
        if let Err(e) = std::fs::remove_file(&temp) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %temp.display(), "could not remove partial download: {}", e);
            }
        }
    }
    result
}

fn fetch_to_temp(url: &str, temp: &Path) -> Result<()> {
    let file = File::options()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp)
        .map_err(Error::Io)?;
    let writer = RefCell::new(io::BufWriter::new(file));
    let write_error: RefCell<Option<io::Error>> = RefCell::new(None);

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(|e| Error::transport(url, e))?;
    easy.follow_location(true).map_err(|e| Error::transport(url, e))?;
    easy.max_redirections(10).map_err(|e| Error::transport(url, e))?;
    easy.connect_timeout(Duration::from_secs(30))
        .map_err(|e| Error::transport(url, e))?;
    easy.low_speed_limit(1024).map_err(|e| Error::transport(url, e))?;
    easy.low_speed_time(Duration::from_secs(60))
        .map_err(|e| Error::transport(url, e))?;
    easy.fail_on_error(true).map_err(|e| Error::transport(url, e))?;

    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                match writer.borrow_mut().write_all(data) {
                    Ok(()) => Ok(data.len()),
                    Err(e) => {
                        *write_error.borrow_mut() = Some(e);
                        Ok(0) // abort transfer
                    }
                }
            })
            .map_err(|e| Error::transport(url, e))?;
        if let Err(e) = transfer.perform() {
            // A disk write failure surfaces as a curl write error; report
            // the underlying IO error instead when we have it.
            if let Some(io_err) = write_error.borrow_mut().take() {
                return Err(Error::transport(url, io_err));
            }
            return Err(Error::transport(url, e));
        }
    }

    let code = easy.response_code().map_err(|e| Error::transport(url, e))?;
    if !(200..300).contains(&code) {
        return Err(Error::transport(
            url,
            io::Error::other(format!("GET returned HTTP {code}")),
        ));
    }

    let file = writer
        .into_inner()
        .into_inner()
        .map_err(|e| Error::transport(url, e.into_error()))?;
    file.sync_all().map_err(Error::Io)?;
    Ok(())
}
