use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Global configuration loaded from `~/.config/stash/config.toml`.
///
/// Everything has a working default: with no config file the cache lives
/// under the XDG cache home (`~/.cache/stash`) and artifacts never expire.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StashConfig {
    /// Cache root directory. The artifact dir, metadata DB, and lock file
    /// are derived from it. Default: `~/.cache/stash`.
    #[serde(default)]
    pub cache_root: Option<PathBuf>,
    /// Expiration window in days. An artifact whose `updated_at` is at
    /// least this old is re-downloaded on the next resolve. None = never.
    #[serde(default)]
    pub expire_days: Option<u64>,
    /// Maximum seconds to wait for the store lock before failing.
    /// None = wait indefinitely.
    #[serde(default)]
    pub lock_timeout_secs: Option<u64>,
}

impl StashConfig {
    /// The effective cache root: the configured override or the XDG default.
    pub fn cache_root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.cache_root {
            return Ok(root.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("stash")?;
        Ok(xdg_dirs.get_cache_home())
    }

    /// Directory holding downloaded artifacts and extraction dirs.
    pub fn artifact_dir(&self) -> Result<PathBuf> {
        Ok(self.cache_root()?.join("artifacts"))
    }

    /// Path of the SQLite metadata store.
    pub fn db_path(&self) -> Result<PathBuf> {
        Ok(self.cache_root()?.join("cache.db"))
    }

    /// Path of the cross-process lock file.
    pub fn lock_path(&self) -> Result<PathBuf> {
        Ok(self.cache_root()?.join("cache.lock"))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("stash")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<StashConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = StashConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: StashConfig = toml::from_str(&data)?;
    Ok(cfg)
}
