use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use avail_core::{deserialize, InterfaceAvailability};
use avail_ipc::{flush_availabilities, AvailabilityClient, TransportError};
use avail_storage::{update_interface_availabilities, SyncReport};
use avail_storage_sqlite::SqliteStore;
use tracing::info;

use crate::Config;

/// Wires configuration to the transport client and the store.
///
/// The client is created once and reused for every report, so a process keeps a
/// single channel to the availability manager.
pub struct Runner {
    pub dir: PathBuf,
    pub cfg: Config,
    client: AvailabilityClient,
}

impl Runner {
    pub fn open(dir: PathBuf) -> Result<Self> {
        let cfg = load_or_create_config(&dir)?;
        Ok(Self::with_config(dir, cfg))
    }

    pub fn with_config(dir: PathBuf, cfg: Config) -> Self {
        let client = AvailabilityClient::new(cfg.socket_path(&dir), cfg.connect_timeout());
        Self { dir, cfg, client }
    }

    pub fn init_dir(dir: &Path) -> Result<()> {
        let cfg = load_or_create_config(dir)?;
        // create db
        let _ = SqliteStore::open(&cfg.db_path(dir))?;
        Ok(())
    }

    pub fn storage(&self) -> Result<SqliteStore> {
        SqliteStore::open(&self.cfg.db_path(&self.dir))
    }

    /// Ship a batch to the availability manager. Transport errors are returned untouched
    /// so the caller can decide to terminate.
    pub fn report(&mut self, batch: &[InterfaceAvailability]) -> Result<(), TransportError> {
        flush_availabilities(&mut self.client, batch)
    }

    /// Persist a batch through the retrying transaction loop.
    pub fn apply(&self, batch: &[InterfaceAvailability]) -> Result<SyncReport> {
        let store = self.storage()?;
        let report = update_interface_availabilities(&store, batch, &self.cfg.sync_options())
            .context("update interface availabilities")?;
        info!(
            passes = report.passes,
            updated = report.updated,
            skipped = report.skipped,
            rejected = report.rejected,
            "batch applied"
        );
        Ok(report)
    }

    /// Decode a serialized batch file and persist it.
    pub fn apply_file(&self, path: &Path) -> Result<SyncReport> {
        let data = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let batch = deserialize(&data).with_context(|| format!("decode batch {}", path.display()))?;
        self.apply(&batch)
    }
}

fn load_or_create_config(dir: &Path) -> Result<Config> {
    let cfg_path = Config::config_path(dir);
    if cfg_path.exists() {
        return Config::load_from(&cfg_path);
    }
    let cfg = Config::default_for_dir();
    cfg.save_to(&cfg_path)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use avail_core::{serialize, Available, InterfaceId};
    use tempfile::tempdir;

    #[test]
    fn init_creates_config_and_db() {
        let dir = tempdir().unwrap();
        Runner::init_dir(dir.path()).unwrap();
        assert!(Config::config_path(dir.path()).exists());
        assert!(dir.path().join(".avail").join("avail.db").exists());
    }

    #[test]
    fn apply_file_updates_rows() {
        let dir = tempdir().unwrap();
        Runner::init_dir(dir.path()).unwrap();
        let runner = Runner::open(dir.path().to_path_buf()).unwrap();
        runner.storage().unwrap().insert_interface(InterfaceId(5)).unwrap();

        let mut ia = InterfaceAvailability::new(5);
        ia.set_available(Available::Unavailable);
        ia.set_error("timeout");
        let clean = InterfaceAvailability::new(5);
        let path = dir.path().join("batch.bin");
        std::fs::write(&path, serialize(&[ia, clean])).unwrap();

        let report = runner.apply_file(&path).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 1);

        let row = runner.storage().unwrap().load_interface(InterfaceId(5)).unwrap().unwrap();
        assert_eq!(row.available, Available::Unavailable);
        assert_eq!(row.error, "timeout");
    }

    #[test]
    fn report_without_service_is_a_transport_error() {
        let dir = tempdir().unwrap();
        let mut cfg = Config::default_for_dir();
        cfg.service.socket_path = dir.path().join("none.sock").to_string_lossy().to_string();
        cfg.service.connect_timeout_secs = 0;
        let mut runner = Runner::with_config(dir.path().to_path_buf(), cfg);

        let err = runner.report(&[InterfaceAvailability::new(1)]).unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }
}
