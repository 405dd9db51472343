use rusqlite::{Connection, Transaction, TransactionBehavior};

use super::retry::{RetryPolicy, perform_write};
use super::DbPool;
use crate::error::Result;

/// Single entry point for store access.
///
/// Reads borrow a pooled connection and run concurrently. Writes run inside a
/// `BEGIN IMMEDIATE` transaction, which takes SQLite's single writer lock up
/// front; if another connection holds it the attempt fails with
/// `SQLITE_BUSY` and the whole closure is re-run under the retry policy.
/// The closure must therefore be safe to execute more than once.
///
/// Callers must not hold any other lock while calling [`Gateway::write`].
#[derive(Clone)]
pub struct Gateway {
    pool: DbPool,
    retry: RetryPolicy,
}

impl Gateway {
    pub fn new(pool: DbPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.pool.get()?;
        f(&conn)
    }

    pub fn write<T, F>(&self, mut f: F) -> Result<T>
    where
        F: FnMut(&Transaction) -> Result<T>,
    {
        let mut conn = self.pool.get()?;
        perform_write(&self.retry, || {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        })
    }
}
