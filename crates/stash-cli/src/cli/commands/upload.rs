//! `stash upload <src> <url>` – uncached copy to a destination identifier.

use anyhow::Result;
use std::path::Path;

use stash_core::Resolver;

pub async fn run_upload(src: &Path, url: &str) -> Result<()> {
    Resolver::upload(src, url).await?;
    println!("Uploaded {} to {}", src.display(), url);
    Ok(())
}
