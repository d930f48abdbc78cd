//! `stash download <url> <dest>` – uncached download to an explicit path.

use anyhow::Result;
use std::path::Path;

use stash_core::Resolver;

pub async fn run_download(url: &str, dest: &Path) -> Result<()> {
    Resolver::download(url, dest).await?;
    println!("Downloaded {} to {}", url, dest.display());
    Ok(())
}
