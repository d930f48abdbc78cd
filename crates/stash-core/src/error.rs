//! Error taxonomy for the resolution pipeline.
//!
//! Transport and extraction failures keep their underlying error as a source
//! so callers see the original cause unchanged; the pipeline never retries
//! or swallows them.

use std::path::PathBuf;

/// Boxed source error for transport/extraction variants.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Nested `outer!inner` syntax used against a target that is not a
    /// directory, or an inner path that would escape the extraction dir.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// Download or remote open failed (network, HTTP status, local IO on
    /// the source side).
    #[error("transport failure for {url}")]
    Transport {
        url: String,
        #[source]
        source: BoxedSource,
    },

    /// Archive extraction failed (corrupt input or unsupported format).
    #[error("extraction failed for {path}")]
    Extraction {
        path: PathBuf,
        #[source]
        source: BoxedSource,
    },

    /// Could not acquire the store's exclusive lock.
    #[error("cache lock: {0}")]
    Lock(String),

    /// Lookup or removal by an unknown id or url.
    #[error("no cached artifact for {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn transport(url: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        Error::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    pub(crate) fn extraction(path: impl Into<PathBuf>, source: impl Into<BoxedSource>) -> Self {
        Error::Extraction {
            path: path.into(),
            source: source.into(),
        }
    }
}
