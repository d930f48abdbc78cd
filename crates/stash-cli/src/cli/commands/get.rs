//! `stash get <identifier>` – resolve to a local path and print it.

use anyhow::Result;
use stash_core::{ResolveOptions, Resolver};

pub async fn run_get(
    resolver: &Resolver,
    identifier: &str,
    extract: bool,
    force_download: bool,
    force_extract: bool,
) -> Result<()> {
    let path = resolver
        .cached_path(
            identifier,
            ResolveOptions {
                extract,
                force_download,
                force_extract,
            },
        )
        .await?;
    println!("{}", path.display());
    Ok(())
}
