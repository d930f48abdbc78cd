//! Identifier classification and nested-archive reference parsing.
//!
//! An identifier is a remote URL (`https://host/file.zip`), a local path
//! (bare or `file://`), or a nested reference `outer!inner/path` selecting
//! a file inside an archive.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Marker splitting a nested reference into outer archive and inner path.
pub const NESTED_SEPARATOR: char = '!';

/// Splits a nested reference at the *last* separator, so the outer part may
/// itself be a nested reference. Returns None when there is no separator.
pub fn split_nested(identifier: &str) -> Option<(&str, &str)> {
    identifier.rsplit_once(NESTED_SEPARATOR)
}

/// Whether the identifier denotes a local filesystem target: either it has
/// no URL scheme at all, or it uses `file://`.
pub fn is_local(identifier: &str) -> bool {
    match url::Url::parse(identifier) {
        Ok(parsed) => parsed.scheme() == "file",
        // Relative-URL parse errors mean a bare path.
        Err(_) => true,
    }
}

/// Converts a local identifier to a plain path, stripping a `file://` prefix
/// when present.
pub fn local_path(identifier: &str) -> PathBuf {
    if let Ok(parsed) = url::Url::parse(identifier) {
        if parsed.scheme() == "file" {
            if let Ok(path) = parsed.to_file_path() {
                return path;
            }
        }
    }
    PathBuf::from(identifier)
}

/// Normalizes the inner part of a nested reference so it can be joined under
/// the extraction directory: strips leading separators and rejects any
/// parent-traversal component that would escape the directory.
pub fn normalize_inner_path(inner: &str) -> Result<PathBuf> {
    let trimmed = inner.trim_start_matches('/');
    let path = Path::new(trimmed);
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::InvalidReference(format!(
                    "inner path {inner:?} escapes the extraction directory"
                )));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_at_last_separator() {
        assert_eq!(
            split_nested("https://host/a.zip!data/b.txt"),
            Some(("https://host/a.zip", "data/b.txt"))
        );
        assert_eq!(
            split_nested("outer.zip!inner.tar!x"),
            Some(("outer.zip!inner.tar", "x"))
        );
        assert_eq!(split_nested("https://host/a.zip"), None);
    }

    #[test]
    fn local_detection() {
        assert!(is_local("/tmp/file.txt"));
        assert!(is_local("relative/path.bin"));
        assert!(is_local("file:///tmp/file.txt"));
        assert!(!is_local("https://example.com/file.zip"));
        assert!(!is_local("s3://bucket/key"));
    }

    #[test]
    fn file_scheme_stripped() {
        assert_eq!(local_path("file:///tmp/a.txt"), PathBuf::from("/tmp/a.txt"));
        assert_eq!(local_path("/tmp/a.txt"), PathBuf::from("/tmp/a.txt"));
    }

    #[test]
    fn inner_path_strips_leading_separators() {
        assert_eq!(
            normalize_inner_path("/data/a.txt").unwrap(),
            PathBuf::from("data/a.txt")
        );
        assert_eq!(normalize_inner_path("a.txt").unwrap(), PathBuf::from("a.txt"));
    }

    #[test]
    fn inner_path_rejects_traversal() {
        assert!(normalize_inner_path("../escape").is_err());
        assert!(normalize_inner_path("data/../../escape").is_err());
    }

    #[test]
    fn inner_path_keeps_curdir_harmless() {
        assert_eq!(
            normalize_inner_path("./data/./a.txt").unwrap(),
            PathBuf::from("data/a.txt")
        );
    }
}
