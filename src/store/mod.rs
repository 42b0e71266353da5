//! Storage boundary.
//!
//! Every ledger operation runs as one closure inside [`Store::transaction`].
//! The closure sees a [`StoreTx`]; returning `Err` discards everything it
//! wrote, returning `Ok` makes it durable.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::LedgerError;
use crate::executor::DbError;
use crate::model::{
    BoxDraft, BoxStatus, BoxView, CableBox, CableType, CableTypeDraft, Project, ProjectDraft,
    Usage, UsageDraft,
};
use crate::pool::PoolError;
use crate::transaction::TransactionError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Unique constraint on `cable_types.prefix`
pub const PREFIX_CONSTRAINT: &str = "cable_types_prefix_key";
/// Unique constraint on `boxes.number`
pub const NUMBER_CONSTRAINT: &str = "boxes_number_key";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(DbError),

    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),

    /// A unique constraint rejected the write
    #[error("unique constraint {constraint} violated")]
    Conflict { constraint: String },

    /// Stored data could not be read back into a record
    #[error("corrupt data: {0}")]
    Corrupt(String),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err.unique_violation_constraint() {
            Some(constraint) => StoreError::Conflict { constraint },
            None => StoreError::Database(err),
        }
    }
}

impl From<TransactionError> for StoreError {
    fn from(err: TransactionError) -> Self {
        StoreError::from(DbError::from(err))
    }
}

/// Reads and writes available inside a transaction
pub trait StoreTx {
    fn insert_cable_type(&mut self, draft: &CableTypeDraft) -> Result<CableType, StoreError>;
    fn cable_type(&mut self, id: i64) -> Result<Option<CableType>, StoreError>;
    fn cable_type_by_prefix(&mut self, prefix: &str) -> Result<Option<CableType>, StoreError>;
    /// Sorted by name
    fn cable_types(&mut self) -> Result<Vec<CableType>, StoreError>;

    /// Serialize box numbering for `prefix` until the transaction ends
    fn lock_prefix(&mut self, prefix: &str) -> Result<(), StoreError>;
    /// Boxes of the type owning `prefix` whose number is `prefix` followed by digits
    fn count_numbered_boxes(&mut self, prefix: &str) -> Result<i64, StoreError>;

    fn insert_box(&mut self, draft: &BoxDraft) -> Result<CableBox, StoreError>;
    /// Read a box and hold it against concurrent writers
    fn box_for_update(&mut self, id: i64) -> Result<Option<CableBox>, StoreError>;
    fn box_view(&mut self, id: i64) -> Result<Option<BoxView>, StoreError>;
    fn box_by_number(&mut self, number: &str) -> Result<Option<BoxView>, StoreError>;
    /// Newest first
    fn boxes(&mut self) -> Result<Vec<BoxView>, StoreError>;
    fn set_box_state(
        &mut self,
        id: i64,
        status: BoxStatus,
        current_quantity: Decimal,
    ) -> Result<CableBox, StoreError>;

    fn append_usage(&mut self, draft: &UsageDraft) -> Result<Usage, StoreError>;
    /// Oldest first
    fn usages_for_box(&mut self, box_id: i64) -> Result<Vec<Usage>, StoreError>;

    fn insert_project(&mut self, draft: &ProjectDraft) -> Result<Project, StoreError>;
    fn project(&mut self, id: i64) -> Result<Option<Project>, StoreError>;
    /// Sorted by name
    fn projects(&mut self) -> Result<Vec<Project>, StoreError>;
}

/// A transactional store
pub trait Store: Send + Sync + 'static {
    /// Run `f` in one transaction, committing on `Ok` and rolling back on `Err`
    fn transaction<T, F>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, LedgerError>;
}
