//! `stash list` – show cached artifacts.

use anyhow::Result;
use std::path::Path;

use stash_core::{archive, Cache};

pub async fn run_list(cache: &Cache, expired: bool, details: bool) -> Result<()> {
    let artifacts = if expired {
        cache.list_expired().await?
    } else {
        cache.list().await?
    };

    if artifacts.is_empty() {
        println!("No cached artifacts.");
        return Ok(());
    }

    if details {
        println!(
            "{:<6} {:<10} {:<8} {:<8} {:<11} {:<11} {:<40} LOCAL PATH",
            "ID", "SIZE", "TYPE", "EXPIRED", "CREATED", "UPDATED", "URL"
        );
    } else {
        println!("{:<6} {:<10} {:<8} {:<8} URL", "ID", "SIZE", "TYPE", "EXPIRED");
    }

    for artifact in artifacts {
        let size = match tokio::fs::metadata(&artifact.local_path).await {
            Ok(meta) => human_size(meta.len()),
            Err(_) => "-".to_string(),
        };
        let kind = artifact_kind(&artifact.local_path);
        let expired = if cache.is_expired(&artifact) { "yes" } else { "no" };

        if details {
            println!(
                "{:<6} {:<10} {:<8} {:<8} {:<11} {:<11} {:<40} {}",
                artifact.id,
                size,
                kind,
                expired,
                artifact.created_at,
                artifact.updated_at,
                artifact.url,
                artifact.local_path.display()
            );
            if let Some(extraction) = &artifact.extraction_path {
                println!("{:>6} extracted to {}", "", extraction.display());
            }
        } else {
            println!(
                "{:<6} {:<10} {:<8} {:<8} {}",
                artifact.id, size, kind, expired, artifact.url
            );
        }
    }

    Ok(())
}

fn artifact_kind(path: &Path) -> &'static str {
    if path.is_dir() {
        "dir"
    } else if archive::is_archive_file(path) {
        "archive"
    } else {
        "file"
    }
}

/// `1234` -> `1.2KiB` and so on, for the SIZE column.
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut value = bytes as f64;
    for unit in UNITS {
        if value < 1024.0 {
            return if unit == "B" {
                format!("{bytes}B")
            } else {
                format!("{value:.1}{unit}")
            };
        }
        value /= 1024.0;
    }
    format!("{value:.1}EiB")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_size_units() {
        assert_eq!(human_size(0), "0B");
        assert_eq!(human_size(512), "512B");
        assert_eq!(human_size(2048), "2.0KiB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0MiB");
    }
}
