//! Deterministic url -> artifact filename mapping.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::archive;

/// Filename for the artifact backing `url`: 64 lowercase hex chars of its
/// sha256, so the url -> path mapping is pure and collision-free in
/// practice. When the identifier's path names an archive, its suffix is
/// carried over (`<hex>.zip`, `<hex>.tar.gz`, ...) so the cached file is
/// still recognized by extension-based archive detection.
pub fn artifact_file_name(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let hex = hex::encode(hasher.finalize());
    match archive_suffix_of(url) {
        Some(suffix) => format!("{hex}{suffix}"),
        None => hex,
    }
}

/// Archive suffix of the identifier's path portion: query strings and
/// fragments on a URL don't hide a `.zip`.
fn archive_suffix_of(url: &str) -> Option<&'static str> {
    match url::Url::parse(url) {
        Ok(parsed) => archive::archive_suffix(Path::new(parsed.path())),
        Err(_) => archive::archive_suffix(Path::new(url)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_across_calls() {
        assert_eq!(
            artifact_file_name("https://example.com/file.zip"),
            artifact_file_name("https://example.com/file.zip")
        );
    }

    #[test]
    fn distinct_urls_distinct_names() {
        assert_ne!(
            artifact_file_name("https://example.com/a"),
            artifact_file_name("https://example.com/b")
        );
    }

    #[test]
    fn plain_identifier_is_bare_hex() {
        let name = artifact_file_name("https://example.com/file.bin");
        assert_eq!(name.len(), 64);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn archive_identifier_keeps_its_suffix() {
        let name = artifact_file_name("https://example.com/file.zip");
        assert!(name.ends_with(".zip"));
        assert_eq!(name.len(), 64 + ".zip".len());
        assert!(crate::archive::is_archive_file(Path::new(&name)));

        let name = artifact_file_name("https://example.com/data.tar.gz");
        assert!(name.ends_with(".tar.gz"));

        let name = artifact_file_name("/local/bundle.tgz");
        assert!(name.ends_with(".tgz"));
    }

    #[test]
    fn query_string_does_not_hide_the_suffix() {
        let name = artifact_file_name("https://example.com/file.zip?token=abc");
        assert!(name.ends_with(".zip"));
    }
}
