//! Migration-specific error types

use crate::executor::DbError;
use crate::transaction::TransactionError;

#[derive(Debug)]
pub enum MigrationError {
    /// Database execution error
    Database(DbError),
    /// Could not begin or finish a migration's transaction
    Transaction(TransactionError),
    /// Another process held the migration lock for too long
    LockTimeout(String),
    /// An applied migration no longer matches its embedded statements
    ChecksumMismatch {
        version: i64,
        name: String,
        stored: String,
        current: String,
    },
    /// The database records a migration this binary does not know
    UnknownApplied { version: i64, name: String },
}

impl std::fmt::Display for MigrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationError::Database(e) => write!(f, "Database error: {}", e),
            MigrationError::Transaction(e) => write!(f, "Migration transaction error: {}", e),
            MigrationError::LockTimeout(msg) => write!(f, "Migration lock timeout: {}", msg),
            MigrationError::ChecksumMismatch {
                version,
                name,
                stored,
                current,
            } => write!(
                f,
                "Migration '{}' (version {}) changed after it was applied: stored checksum {}, current {}",
                name, version, stored, current
            ),
            MigrationError::UnknownApplied { version, name } => write!(
                f,
                "Database has migration '{}' (version {}) that this build does not contain",
                name, version
            ),
        }
    }
}

impl std::error::Error for MigrationError {}

impl From<DbError> for MigrationError {
    fn from(err: DbError) -> Self {
        MigrationError::Database(err)
    }
}

impl From<TransactionError> for MigrationError {
    fn from(err: TransactionError) -> Self {
        MigrationError::Transaction(err)
    }
}
