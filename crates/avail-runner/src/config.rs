use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use avail_storage::{SyncOptions, DEFAULT_FLUSH_THRESHOLD};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Unix socket of the availability manager. `~` is expanded.
    pub socket_path: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Relative paths resolve against the directory holding `.avail/`.
    pub path: String,
    #[serde(default = "default_flush_threshold_bytes")]
    pub flush_threshold_bytes: usize,
    #[serde(default)]
    pub retry_backoff_ms: u64,
}

fn default_connect_timeout_secs() -> u64 {
    60
}

fn default_flush_threshold_bytes() -> usize {
    DEFAULT_FLUSH_THRESHOLD
}

impl Config {
    pub fn default_for_dir() -> Self {
        Self {
            service: ServiceConfig {
                socket_path: "~/.avail/availability.sock".to_string(),
                connect_timeout_secs: default_connect_timeout_secs(),
            },
            database: DatabaseConfig {
                path: ".avail/avail.db".to_string(),
                flush_threshold_bytes: default_flush_threshold_bytes(),
                retry_backoff_ms: 0,
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&s).with_context(|| "parse avail.toml")?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn config_path(dir: &Path) -> PathBuf {
        dir.join(".avail").join("avail.toml")
    }

    pub fn socket_path(&self, dir: &Path) -> PathBuf {
        resolve(dir, &self.service.socket_path)
    }

    pub fn db_path(&self, dir: &Path) -> PathBuf {
        resolve(dir, &self.database.path)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.service.connect_timeout_secs)
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            flush_threshold: self.database.flush_threshold_bytes,
            retry_backoff: Duration::from_millis(self.database.retry_backoff_ms),
        }
    }
}

fn resolve(dir: &Path, raw: &str) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(raw).to_string());
    if expanded.is_absolute() {
        expanded
    } else {
        dir.join(expanded)
    }
}
