//! Archive detection and extraction (zip, tar, tar.gz, plain gzip).
//!
//! Detection is extension based. Extraction fully materializes the archive
//! into the destination directory and rejects entries that would escape it.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    Zip,
    Tar,
    TarGz,
    TarBz2,
    Gzip,
}

// Compound suffixes first so `.tar.gz` never matches as plain `.gz`.
const SUFFIXES: [(&str, ArchiveKind); 6] = [
    (".tar.gz", ArchiveKind::TarGz),
    (".tar.bz2", ArchiveKind::TarBz2),
    (".tgz", ArchiveKind::TarGz),
    (".tar", ArchiveKind::Tar),
    (".zip", ArchiveKind::Zip),
    (".gz", ArchiveKind::Gzip),
];

fn suffix_and_kind(path: &Path) -> Option<(&'static str, ArchiveKind)> {
    let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
    SUFFIXES
        .iter()
        .find(|(suffix, _)| name.ends_with(suffix))
        .copied()
}

fn kind_of(path: &Path) -> Option<ArchiveKind> {
    suffix_and_kind(path).map(|(_, kind)| kind)
}

/// Whether `path` names a recognized archive. Purely extension based, so it
/// works for identifiers (URLs, not-yet-downloaded paths) as well as files.
pub fn is_archive_file(path: &Path) -> bool {
    kind_of(path).is_some()
}

/// The recognized archive suffix of `path`, if any. Cache-key derivation
/// carries it over onto the artifact filename so a cached archive is still
/// detected as one.
pub fn archive_suffix(path: &Path) -> Option<&'static str> {
    suffix_and_kind(path).map(|(suffix, _)| suffix)
}

/// Extract `archive` fully into `dest`, creating it first. Blocking; the
/// resolver runs this on the blocking pool. Fails with `Extraction` on
/// corrupt input, unsupported formats, or entries escaping `dest`.
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let kind = kind_of(archive)
        .ok_or_else(|| Error::extraction(archive, anyhow::anyhow!("not a recognized archive")))?;
    std::fs::create_dir_all(dest).map_err(|e| Error::extraction(archive, e))?;

    let result: io::Result<()> = match kind {
        ArchiveKind::Zip => extract_zip(archive, dest),
        ArchiveKind::Tar => File::open(archive).and_then(|f| extract_tar(f, dest)),
        ArchiveKind::TarGz => {
            File::open(archive).and_then(|f| extract_tar(flate2::read::GzDecoder::new(f), dest))
        }
        ArchiveKind::TarBz2 => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "bzip2 archives are recognized but not extractable",
        )),
        ArchiveKind::Gzip => extract_gzip(archive, dest),
    };
    result.map_err(|e| Error::extraction(archive, e))
}

fn extract_zip(archive: &Path, dest: &Path) -> io::Result<()> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(io::Error::other)?;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(io::Error::other)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(io::Error::other(format!(
                "zip entry {:?} escapes the destination",
                entry.name()
            )));
        };
        let out_path = dest.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&out_path)?;
            io::copy(&mut entry, &mut out)?;
        }
    }
    Ok(())
}

fn extract_tar<R: io::Read>(reader: R, dest: &Path) -> io::Result<()> {
    // tar's unpack already refuses entries that escape `dest`.
    let mut tar = tar::Archive::new(reader);
    tar.unpack(dest)
}

/// Plain gzip holds a single file; decompress it into `dest` under the
/// archive's name minus the `.gz` suffix.
fn extract_gzip(archive: &Path, dest: &Path) -> io::Result<()> {
    let name = archive
        .file_stem()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("decompressed"));
    let file = File::open(archive)?;
    let mut decoder = flate2::read::GzDecoder::new(file);
    let mut out = File::create(dest.join(name))?;
    io::copy(&mut decoder, &mut out)?;
    Ok(())
}
