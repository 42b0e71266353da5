//! Schema migrations.
//!
//! Migrations are compiled in (see [`schema::MIGRATIONS`]) and applied in
//! version order, each in its own transaction, while a session advisory lock
//! keeps concurrent starters out. Every applied migration is recorded with a
//! SHA-256 checksum of its statements; editing a migration after it shipped
//! is reported instead of silently ignored.

pub mod error;
pub mod lock;
pub mod schema;
pub mod state_table;

pub use error::MigrationError;
pub use lock::MigrationLockGuard;

use crate::executor::Executor;
use crate::transaction::{IsolationLevel, Transaction};
use may_postgres::Client;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};

/// One versioned migration
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// `YYYYMMDDHHMMSS`
    pub version: i64,
    pub name: &'static str,
    pub statements: &'static [&'static str],
}

impl Migration {
    /// Hex SHA-256 over the statements
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        for statement in self.statements {
            hasher.update(statement.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }
}

pub struct Migrator {
    migrations: &'static [Migration],
    lock_timeout: Duration,
}

impl Migrator {
    /// The migrations compiled into this binary
    pub fn embedded() -> Self {
        Self::new(schema::MIGRATIONS)
    }

    pub fn new(migrations: &'static [Migration]) -> Self {
        Self {
            migrations,
            lock_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Migrations not yet recorded in the state table
    pub fn pending(&self, executor: &dyn Executor) -> Result<Vec<Migration>, MigrationError> {
        state_table::initialize(executor)?;
        let applied = state_table::applied(executor)?;

        for record in &applied {
            match self.migrations.iter().find(|m| m.version == record.version) {
                Some(known) => {
                    let current = known.checksum();
                    if current != record.checksum {
                        return Err(MigrationError::ChecksumMismatch {
                            version: record.version,
                            name: record.name.clone(),
                            stored: record.checksum.clone(),
                            current,
                        });
                    }
                }
                None => {
                    return Err(MigrationError::UnknownApplied {
                        version: record.version,
                        name: record.name.clone(),
                    })
                }
            }
        }

        Ok(self
            .migrations
            .iter()
            .filter(|m| !applied.iter().any(|a| a.version == m.version))
            .copied()
            .collect())
    }

    /// Apply every pending migration; returns how many ran
    pub fn run(&self, client: &Client) -> Result<usize, MigrationError> {
        let _lock = MigrationLockGuard::acquire(client, self.lock_timeout)?;

        let pending = self.pending(client)?;
        if pending.is_empty() {
            log::info!("schema is up to date");
            return Ok(0);
        }

        for migration in &pending {
            let start = Instant::now();
            let txn = Transaction::begin(client, IsolationLevel::ReadCommitted)?;
            for statement in migration.statements {
                txn.execute(statement, &[])?;
            }
            let elapsed_ms = start.elapsed().as_millis() as i64;
            state_table::record(
                &txn,
                migration.version,
                migration.name,
                &migration.checksum(),
                elapsed_ms,
            )?;
            txn.commit()?;
            log::info!(
                "applied migration {} {} in {}ms",
                migration.version,
                migration.name,
                elapsed_ms
            );
        }
        Ok(pending.len())
    }
}
