//! Row types for the artifact metadata store.

use std::path::PathBuf;

/// Artifact identifier (SQLite rowid, monotonically assigned).
pub type ArtifactId = i64;

/// One cached artifact: the local materialization of a URL or path.
///
/// `local_path` is a pure function of `url` (sha256 of the identifier under
/// the artifact dir); `extraction_path` is present iff the artifact has been
/// extracted and always denotes a full extraction of `local_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    pub id: ArtifactId,
    pub url: String,
    pub local_path: PathBuf,
    pub extraction_path: Option<PathBuf>,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds; bumped on every successful download or extraction,
    /// drives expiration.
    pub updated_at: i64,
}
