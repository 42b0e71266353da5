//! The usage counter only moves for closes that committed.

#![cfg(feature = "metrics")]

use cabletrack::error::{ErrorKind, LedgerError};
use cabletrack::labels::TsplLabelIssuer;
use cabletrack::metrics::METRICS;
use cabletrack::model::{CloseBox, NewBox, NewCableType, NewProject};
use cabletrack::{Inventory, MemoryStore, Store, StoreError, StoreTx};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Runs the work, then fails at commit while `fail_commit` is set
struct FlakyCommit {
    inner: MemoryStore,
    fail_commit: Arc<AtomicBool>,
}

impl Store for FlakyCommit {
    fn transaction<T, F>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, LedgerError>,
    {
        let value = self.inner.transaction(f)?;
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(StoreError::Corrupt("commit failed".to_string()).into());
        }
        Ok(value)
    }
}

#[test]
fn test_usage_counted_after_commit_only() {
    let labels = TempDir::new().unwrap();
    let fail_commit = Arc::new(AtomicBool::new(false));
    let store = FlakyCommit {
        inner: MemoryStore::new(),
        fail_commit: Arc::clone(&fail_commit),
    };
    let inventory = Inventory::new(store, Arc::new(TsplLabelIssuer::new(labels.path())));

    let cable_type = inventory
        .cable_types()
        .create(NewCableType::new("Cat6", "CAT6"))
        .unwrap();
    let project = inventory.projects().create(NewProject::new("Depot")).unwrap();
    let ledger = inventory.ledger();
    let created = ledger
        .create(NewBox::new(cable_type.id, Decimal::from(100)))
        .unwrap();

    let before = METRICS.usage_recorded.get();
    fail_commit.store(true, Ordering::SeqCst);
    let err = ledger
        .close(created.id, CloseBox::new(Decimal::from(60), project.id, "Alice"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(METRICS.usage_recorded.get(), before);

    fail_commit.store(false, Ordering::SeqCst);
    ledger
        .close(created.id, CloseBox::new(Decimal::from(20), project.id, "Alice"))
        .unwrap();
    assert_eq!(METRICS.usage_recorded.get(), before + 1);
}
