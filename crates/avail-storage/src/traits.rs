use avail_core::InterfaceId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Contention or a lost connection; the whole transaction may be retried.
    #[error("database temporarily unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Failed(String),
}

impl StoreError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Classified result of finishing a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxnOutcome {
    Committed,
    /// The transaction was rolled back and can be replayed from the start.
    Recoverable(StoreError),
    Fatal(StoreError),
}

impl From<StoreError> for TxnOutcome {
    fn from(err: StoreError) -> Self {
        if err.is_recoverable() {
            TxnOutcome::Recoverable(err)
        } else {
            TxnOutcome::Fatal(err)
        }
    }
}

/// Transactional SQL sink the availability flush runs against.
///
/// One transaction at a time; the caller serializes flushes.
pub trait AvailabilityStore: Send + Sync {
    fn begin(&self) -> Result<(), StoreError>;

    /// Run one or more `;`-separated statements inside the open transaction.
    fn execute(&self, sql: &str) -> Result<(), StoreError>;

    /// Commit the open transaction. A `Recoverable` outcome means the store already rolled back.
    fn commit(&self) -> TxnOutcome;

    fn rollback(&self) -> Result<(), StoreError>;

    /// Whether rows keyed by `interface_id` can exist in this store. Records for other ids
    /// are left out of the transaction.
    fn accepts_interface(&self, _interface_id: InterfaceId) -> bool {
        true
    }

    /// Quote-safe, length-limited text for interpolation into `table.field`.
    fn escape_field(&self, table: &str, field: &str, value: &str) -> String {
        crate::projection::escape_field(table, field, value)
    }

    /// Text opening a multi-statement update. Empty where the backend needs none.
    fn multi_update_header(&self) -> &str {
        ""
    }

    fn multi_update_footer(&self) -> &str {
        ""
    }
}
