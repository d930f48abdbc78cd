//! `stash remove <id-or-url>` – delete a cached artifact and its files.

use anyhow::Result;
use stash_core::{ArtifactKey, Resolver};

pub async fn run_remove(resolver: &Resolver, key: &str) -> Result<()> {
    let key = ArtifactKey::parse(key);
    resolver.remove(&key).await?;
    println!("Removed cached artifact.");
    Ok(())
}
