//! Append-only consumption log.
//!
//! Records are only written by a box close, inside the close's own
//! transaction; nothing here updates or deletes. The database enforces the
//! same rule with a trigger.

use crate::error::LedgerError;
use crate::model::{Usage, UsageDraft};
use crate::store::{Store, StoreTx};

pub(crate) fn append(tx: &mut dyn StoreTx, draft: &UsageDraft) -> Result<Usage, LedgerError> {
    debug_assert!(draft.quantity_used >= rust_decimal::Decimal::ZERO);
    Ok(tx.append_usage(draft)?)
}

/// Usage records of one box, oldest first
pub fn history<S: Store>(store: &S, box_id: i64) -> Result<Vec<Usage>, LedgerError> {
    store.transaction(|tx| {
        if tx.box_view(box_id)?.is_none() {
            return Err(LedgerError::not_found("box", box_id));
        }
        Ok(tx.usages_for_box(box_id)?)
    })
}
