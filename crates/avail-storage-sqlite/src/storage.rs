use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use avail_core::{Available, InterfaceId};
use avail_storage::{AvailabilityStore, StoreError, TxnOutcome};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::warn;

/// How long sqlite itself waits on a locked database before reporting it busy.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// One row of the `interface` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceRow {
    pub interface_id: InterfaceId,
    pub available: Available,
    pub error: String,
    pub errors_from: i32,
    pub disable_until: i32,
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(db_path).with_context(|| format!("open sqlite db {}", db_path.display()))?;
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        // init schema
        let init_sql = include_str!("../migrations/0001_init.sql");
        conn.execute_batch(init_sql).context("migrate interface schema")?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn().busy_timeout(timeout)?;
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a row with column defaults. Existing rows are left alone.
    pub fn insert_interface(&self, interface_id: InterfaceId) -> Result<()> {
        let key = row_key(interface_id)?;
        self.conn()
            .execute("INSERT OR IGNORE INTO interface(interfaceid) VALUES (?1)", params![key])?;
        Ok(())
    }

    pub fn load_interface(&self, interface_id: InterfaceId) -> Result<Option<InterfaceRow>> {
        let key = row_key(interface_id)?;
        let row = self
            .conn()
            .query_row(
                "SELECT interfaceid, available, error, errors_from, disable_until FROM interface WHERE interfaceid=?1",
                params![key],
                |r| {
                    let raw: u8 = r.get(1)?;
                    let available = Available::from_u8(raw).ok_or_else(|| {
                        rusqlite::Error::FromSqlConversionFailure(
                            1,
                            Type::Integer,
                            format!("invalid availability value {}", raw).into(),
                        )
                    })?;
                    Ok(InterfaceRow {
                        interface_id: InterfaceId(r.get::<_, i64>(0)? as u64),
                        available,
                        error: r.get(2)?,
                        errors_from: r.get(3)?,
                        disable_until: r.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}

/// SQLite row keys are signed 64-bit; larger ids cannot be stored.
fn row_key(interface_id: InterfaceId) -> Result<i64> {
    i64::try_from(interface_id.get()).map_err(|_| anyhow!("interface id {} exceeds the sqlite row key range", interface_id))
}

fn classify(err: rusqlite::Error) -> StoreError {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Failed(err.to_string()),
    }
}

impl AvailabilityStore for SqliteStore {
    fn begin(&self) -> Result<(), StoreError> {
        self.conn().execute_batch("BEGIN").map_err(classify)
    }

    fn execute(&self, sql: &str) -> Result<(), StoreError> {
        self.conn().execute_batch(sql).map_err(classify)
    }

    fn commit(&self) -> TxnOutcome {
        let conn = self.conn();
        match conn.execute_batch("COMMIT") {
            Ok(()) => TxnOutcome::Committed,
            Err(err) => {
                // a busy COMMIT leaves the transaction open
                if !conn.is_autocommit() {
                    if let Err(rb) = conn.execute_batch("ROLLBACK") {
                        warn!(error = %rb, "rollback after failed commit");
                    }
                }
                classify(err).into()
            }
        }
    }

    fn accepts_interface(&self, interface_id: InterfaceId) -> bool {
        row_key(interface_id).is_ok()
    }

    fn rollback(&self) -> Result<(), StoreError> {
        let conn = self.conn();
        if conn.is_autocommit() {
            return Ok(());
        }
        conn.execute_batch("ROLLBACK").map_err(classify)
    }
}
