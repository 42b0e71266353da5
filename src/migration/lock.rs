//! Session advisory lock held while migrations run.

use crate::executor::Executor;
use crate::migration::MigrationError;
use std::time::{Duration, Instant};

/// Advisory lock key shared by every cabletrack process
pub const MIGRATION_LOCK_KEY: i64 = 0x6361_626c_6574_726b;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Holds the migration lock; releases it when dropped
pub struct MigrationLockGuard<'a> {
    executor: &'a dyn Executor,
}

impl<'a> MigrationLockGuard<'a> {
    /// Poll `pg_try_advisory_lock` until it succeeds or `timeout` passes
    pub fn acquire(executor: &'a dyn Executor, timeout: Duration) -> Result<Self, MigrationError> {
        let start = Instant::now();
        loop {
            let row = executor.query_one("SELECT pg_try_advisory_lock($1)", &[&MIGRATION_LOCK_KEY])?;
            let locked: bool = row
                .try_get(0)
                .map_err(|e| MigrationError::Database(e.into()))?;
            if locked {
                log::debug!("acquired migration lock after {:?}", start.elapsed());
                return Ok(Self { executor });
            }
            if start.elapsed() >= timeout {
                return Err(MigrationError::LockTimeout(format!(
                    "lock {MIGRATION_LOCK_KEY} still held after {timeout:?}; \
                     another process may be migrating"
                )));
            }
            may::coroutine::sleep(POLL_INTERVAL);
        }
    }
}

impl Drop for MigrationLockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self
            .executor
            .execute("SELECT pg_advisory_unlock($1)", &[&MIGRATION_LOCK_KEY])
        {
            log::warn!("failed to release migration lock: {e}");
        }
    }
}
