use std::time::Duration;

use avail_core::InterfaceAvailability;
use tracing::{debug, warn};

use crate::{build_update, AvailabilityStore, StatementBatch, StoreError, TxnOutcome};

/// Accumulated statement text is executed early once it grows past this many bytes.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 128 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncOptions {
    pub flush_threshold: usize,
    /// Pause between passes after a recoverable failure. Zero retries immediately.
    pub retry_backoff: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            retry_backoff: Duration::ZERO,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Transactions attempted, including the one that finally committed.
    pub passes: u32,
    /// Records that produced an update in the committed pass.
    pub updated: usize,
    /// Records skipped because nothing was dirty.
    pub skipped: usize,
    /// Records whose interface id the store cannot hold.
    pub rejected: usize,
}

/// Apply a batch of availability updates in a single transaction.
///
/// A recoverable store failure replays the whole batch from the start, without limit.
/// Every pass rebuilds the statements from `batch`, so nothing carries over between passes.
pub fn update_interface_availabilities<S: AvailabilityStore + ?Sized>(
    store: &S,
    batch: &[InterfaceAvailability],
    opts: &SyncOptions,
) -> Result<SyncReport, StoreError> {
    let mut passes = 0;

    loop {
        passes += 1;
        let (outcome, counts) = run_pass(store, batch, opts);

        match outcome {
            TxnOutcome::Committed => {
                debug!(
                    passes,
                    updated = counts.updated,
                    skipped = counts.skipped,
                    rejected = counts.rejected,
                    "interface availabilities committed"
                );
                return Ok(SyncReport { passes, ..counts });
            }
            TxnOutcome::Recoverable(err) => {
                warn!(pass = passes, error = %err, "availability transaction failed, retrying");
                if !opts.retry_backoff.is_zero() {
                    std::thread::sleep(opts.retry_backoff);
                }
            }
            TxnOutcome::Fatal(err) => return Err(err),
        }
    }
}

fn run_pass<S: AvailabilityStore + ?Sized>(
    store: &S,
    batch: &[InterfaceAvailability],
    opts: &SyncOptions,
) -> (TxnOutcome, SyncReport) {
    let mut counts = SyncReport::default();

    if let Err(err) = store.begin() {
        return (err.into(), counts);
    }

    let mut sql = StatementBatch::new(store.multi_update_header(), store.multi_update_footer(), opts.flush_threshold);

    for ia in batch {
        if !ia.is_dirty() {
            counts.skipped += 1;
            continue;
        }
        if !store.accepts_interface(ia.interface_id) {
            warn!(interface_id = %ia.interface_id, "interface id out of range for store, record dropped");
            counts.rejected += 1;
            continue;
        }
        let Some(fragment) = build_update(ia, store) else {
            counts.skipped += 1;
            continue;
        };
        sql.push(&fragment);
        counts.updated += 1;

        if let Some(text) = sql.take_if_over() {
            if let Err(err) = store.execute(&text) {
                return (abort(store, err), counts);
            }
        }
    }

    if let Some(text) = sql.finish() {
        if let Err(err) = store.execute(&text) {
            return (abort(store, err), counts);
        }
    }

    (store.commit(), counts)
}

fn abort<S: AvailabilityStore + ?Sized>(store: &S, err: StoreError) -> TxnOutcome {
    if let Err(rb) = store.rollback() {
        warn!(error = %rb, "rollback failed");
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use avail_core::Available;

    fn record(id: u64) -> InterfaceAvailability {
        let mut ia = InterfaceAvailability::new(id);
        ia.set_available(Available::Available);
        ia
    }

    #[test]
    fn empty_batch_commits_without_sql() {
        let store = MemoryStore::new();
        let report = update_interface_availabilities(&store, &[], &SyncOptions::default()).unwrap();
        assert_eq!(report, SyncReport { passes: 1, ..Default::default() });
        assert!(store.committed().is_empty());
        assert_eq!(store.begins(), 1);
    }

    #[test]
    fn clean_records_are_skipped() {
        let store = MemoryStore::new();
        let batch = vec![record(1), InterfaceAvailability::new(2), record(3)];
        let report = update_interface_availabilities(&store, &batch, &SyncOptions::default()).unwrap();

        assert_eq!(report.updated, 2);
        assert_eq!(report.skipped, 1);
        let committed = store.committed();
        assert_eq!(committed.len(), 1);
        assert_eq!(
            committed[0],
            "update interface set available=1 where interfaceid=1;\nupdate interface set available=1 where interfaceid=3;\n"
        );
    }

    #[test]
    fn small_threshold_executes_early() {
        let store = MemoryStore::new();
        let batch: Vec<_> = (1..=3).map(record).collect();
        let opts = SyncOptions { flush_threshold: 1, ..Default::default() };
        update_interface_availabilities(&store, &batch, &opts).unwrap();
        assert_eq!(store.committed().len(), 3);
    }

    #[test]
    fn fatal_commit_is_returned() {
        let store = MemoryStore::new();
        store.fail_commit_with(StoreError::Failed("disk full".into()));
        let err = update_interface_availabilities(&store, &[record(1)], &SyncOptions::default()).unwrap_err();
        assert_eq!(err, StoreError::Failed("disk full".into()));
        assert_eq!(store.begins(), 1);
    }

    #[test]
    fn recoverable_execute_rolls_back_and_retries() {
        let store = MemoryStore::new();
        store.fail_executes(2);
        let report = update_interface_availabilities(&store, &[record(1)], &SyncOptions::default()).unwrap();
        assert_eq!(report.passes, 3);
        assert_eq!(store.rollbacks(), 2);
        assert_eq!(store.committed().len(), 1);
    }
}
