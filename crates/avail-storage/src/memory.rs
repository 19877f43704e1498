use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::traits::{AvailabilityStore, StoreError, TxnOutcome};

/// In-memory store for tests. Records executed statements instead of applying them and
/// can be scripted to fail a number of executes or commits.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    open: Option<Vec<String>>,
    committed: Vec<String>,
    passes: Vec<Vec<String>>,
    begins: usize,
    rollbacks: usize,
    unavailable_commits: usize,
    unavailable_executes: usize,
    commit_error: Option<StoreError>,
}

impl Inner {
    fn close(&mut self) {
        let statements = self.open.take().unwrap_or_default();
        self.passes.push(statements);
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The next `n` commits report the database as temporarily unavailable.
    pub fn fail_commits(&self, n: usize) {
        self.inner().unavailable_commits = n;
    }

    /// The next `n` executes report the database as temporarily unavailable.
    pub fn fail_executes(&self, n: usize) {
        self.inner().unavailable_executes = n;
    }

    /// Every commit fails with `err` (after any scripted recoverable failures).
    pub fn fail_commit_with(&self, err: StoreError) {
        self.inner().commit_error = Some(err);
    }

    /// Statements of every committed transaction, in execution order.
    pub fn committed(&self) -> Vec<String> {
        self.inner().committed.clone()
    }

    /// Statements executed per finished transaction, committed or not.
    pub fn passes(&self) -> Vec<Vec<String>> {
        self.inner().passes.clone()
    }

    pub fn begins(&self) -> usize {
        self.inner().begins
    }

    pub fn rollbacks(&self) -> usize {
        self.inner().rollbacks
    }
}

impl AvailabilityStore for MemoryStore {
    fn begin(&self) -> Result<(), StoreError> {
        let mut inner = self.inner();
        if inner.open.is_some() {
            return Err(StoreError::Failed("transaction already open".into()));
        }
        inner.begins += 1;
        inner.open = Some(vec![]);
        Ok(())
    }

    fn execute(&self, sql: &str) -> Result<(), StoreError> {
        let mut inner = self.inner();
        if inner.unavailable_executes > 0 {
            inner.unavailable_executes -= 1;
            return Err(StoreError::Unavailable("connection lost".into()));
        }
        match inner.open.as_mut() {
            Some(statements) => {
                statements.push(sql.to_string());
                Ok(())
            }
            None => Err(StoreError::Failed("no transaction".into())),
        }
    }

    fn commit(&self) -> TxnOutcome {
        let mut inner = self.inner();
        if inner.open.is_none() {
            return TxnOutcome::Fatal(StoreError::Failed("no transaction".into()));
        }
        if inner.unavailable_commits > 0 {
            inner.unavailable_commits -= 1;
            inner.close();
            return TxnOutcome::Recoverable(StoreError::Unavailable("database is down".into()));
        }
        if let Some(err) = inner.commit_error.clone() {
            inner.close();
            return TxnOutcome::Fatal(err);
        }

        let statements = inner.open.clone().unwrap_or_default();
        inner.committed.extend(statements);
        inner.close();
        TxnOutcome::Committed
    }

    fn rollback(&self) -> Result<(), StoreError> {
        let mut inner = self.inner();
        inner.rollbacks += 1;
        inner.close();
        Ok(())
    }
}
