//! CLI for the stash artifact cache.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stash_core::{config, Resolver, StashConfig};

use commands::{run_download, run_get, run_list, run_remove, run_upload};

/// Top-level CLI for the stash artifact cache.
#[derive(Debug, Parser)]
#[command(name = "stash")]
#[command(about = "stash: resolve URLs and archive references to cached local paths", long_about = None)]
pub struct Cli {
    /// Cache root directory (overrides the config file).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Expiration window in days (overrides the config file).
    #[arg(long, global = true)]
    pub expire_days: Option<u64>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Resolve an identifier to a local path, downloading/extracting as needed.
    Get {
        /// URL, local path, or nested `outer!inner` reference.
        identifier: String,

        /// Extract the artifact if it is an archive and return the directory.
        #[arg(long)]
        extract: bool,

        /// Re-download even if a fresh artifact is cached.
        #[arg(long)]
        force_download: bool,

        /// Re-extract, discarding any previous extraction directory.
        #[arg(long)]
        force_extract: bool,
    },

    /// Show cached artifacts.
    List {
        /// Only artifacts past the expiration window.
        #[arg(long)]
        expired: bool,

        /// Include paths and timestamps.
        #[arg(long)]
        details: bool,
    },

    /// Remove a cached artifact (and its files) by id or url.
    Remove {
        /// Record id (all digits) or the original identifier.
        key: String,
    },

    /// Download a URL straight to a destination path, bypassing the cache.
    Download {
        url: String,
        dest: PathBuf,
    },

    /// Copy a local file to a destination identifier, bypassing the cache.
    Upload {
        src: PathBuf,
        url: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg: StashConfig = config::load_or_init()?;
        if cli.root.is_some() {
            cfg.cache_root = cli.root.clone();
        }
        if cli.expire_days.is_some() {
            cfg.expire_days = cli.expire_days;
        }
        tracing::debug!("effective config: {:?}", cfg);

        match cli.command {
            CliCommand::Get {
                identifier,
                extract,
                force_download,
                force_extract,
            } => {
                let resolver = Resolver::from_config(&cfg).await?;
                run_get(&resolver, &identifier, extract, force_download, force_extract).await?;
            }
            CliCommand::List { expired, details } => {
                let resolver = Resolver::from_config(&cfg).await?;
                run_list(resolver.cache(), expired, details).await?;
            }
            CliCommand::Remove { key } => {
                let resolver = Resolver::from_config(&cfg).await?;
                run_remove(&resolver, &key).await?;
            }
            CliCommand::Download { url, dest } => run_download(&url, &dest).await?,
            CliCommand::Upload { src, url } => run_upload(&src, &url).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
