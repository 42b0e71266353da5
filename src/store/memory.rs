//! In-process store for tests and `serve --in-memory`.
//!
//! Transactions are serialized on one mutex. Each runs against a scratch copy
//! of the tables which replaces the live copy only when the closure succeeds.

use super::{Store, StoreError, StoreTx, NUMBER_CONSTRAINT, PREFIX_CONSTRAINT};
use crate::error::LedgerError;
use crate::minter;
use crate::model::{
    BoxDraft, BoxStatus, BoxView, CableBox, CableType, CableTypeDraft, Project, ProjectDraft,
    Usage, UsageDraft,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Mutex;

#[derive(Debug, Clone, Default)]
struct Tables {
    cable_types: Vec<CableType>,
    boxes: Vec<CableBox>,
    usages: Vec<Usage>,
    projects: Vec<Project>,
    last_id: LastIds,
}

#[derive(Debug, Clone, Copy, Default)]
struct LastIds {
    cable_type: i64,
    cable_box: i64,
    usage: i64,
    project: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn transaction<T, F>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, LedgerError>,
    {
        let mut live = self
            .tables
            .lock()
            .map_err(|_| StoreError::Corrupt("memory store lock poisoned".to_string()))?;
        let mut scratch = live.clone();
        let out = f(&mut MemoryTx {
            tables: &mut scratch,
        })?;
        *live = scratch;
        Ok(out)
    }
}

struct MemoryTx<'a> {
    tables: &'a mut Tables,
}

impl MemoryTx<'_> {
    fn view(&self, cable_box: &CableBox) -> Result<BoxView, StoreError> {
        let cable_type = self
            .tables
            .cable_types
            .iter()
            .find(|t| t.id == cable_box.cable_type_id)
            .ok_or_else(|| {
                StoreError::Corrupt(format!(
                    "box {} references missing cable type {}",
                    cable_box.number, cable_box.cable_type_id
                ))
            })?;
        Ok(BoxView {
            cable_box: cable_box.clone(),
            cable_type_name: cable_type.name.clone(),
            prefix: cable_type.prefix.clone(),
        })
    }
}

impl StoreTx for MemoryTx<'_> {
    fn insert_cable_type(&mut self, draft: &CableTypeDraft) -> Result<CableType, StoreError> {
        if self
            .tables
            .cable_types
            .iter()
            .any(|t| t.prefix == draft.prefix)
        {
            return Err(StoreError::Conflict {
                constraint: PREFIX_CONSTRAINT.to_string(),
            });
        }
        self.tables.last_id.cable_type += 1;
        let row = CableType {
            id: self.tables.last_id.cable_type,
            name: draft.name.clone(),
            prefix: draft.prefix.clone(),
            description: draft.description.clone(),
            unit: draft.unit.clone(),
            created_at: Utc::now(),
        };
        self.tables.cable_types.push(row.clone());
        Ok(row)
    }

    fn cable_type(&mut self, id: i64) -> Result<Option<CableType>, StoreError> {
        Ok(self.tables.cable_types.iter().find(|t| t.id == id).cloned())
    }

    fn cable_type_by_prefix(&mut self, prefix: &str) -> Result<Option<CableType>, StoreError> {
        Ok(self
            .tables
            .cable_types
            .iter()
            .find(|t| t.prefix == prefix)
            .cloned())
    }

    fn cable_types(&mut self) -> Result<Vec<CableType>, StoreError> {
        let mut rows = self.tables.cable_types.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    fn lock_prefix(&mut self, _prefix: &str) -> Result<(), StoreError> {
        // The store mutex already serializes every transaction.
        Ok(())
    }

    fn count_numbered_boxes(&mut self, prefix: &str) -> Result<i64, StoreError> {
        let owner = match self.tables.cable_types.iter().find(|t| t.prefix == prefix) {
            Some(t) => t.id,
            None => return Ok(0),
        };
        Ok(self
            .tables
            .boxes
            .iter()
            .filter(|b| b.cable_type_id == owner && minter::is_numbered_under(&b.number, prefix))
            .count() as i64)
    }

    fn insert_box(&mut self, draft: &BoxDraft) -> Result<CableBox, StoreError> {
        if self.tables.boxes.iter().any(|b| b.number == draft.number) {
            return Err(StoreError::Conflict {
                constraint: NUMBER_CONSTRAINT.to_string(),
            });
        }
        self.tables.last_id.cable_box += 1;
        let row = CableBox {
            id: self.tables.last_id.cable_box,
            number: draft.number.clone(),
            cable_type_id: draft.cable_type_id,
            initial_quantity: draft.initial_quantity,
            current_quantity: draft.initial_quantity,
            status: BoxStatus::New,
            created_at: Utc::now(),
        };
        self.tables.boxes.push(row.clone());
        Ok(row)
    }

    fn box_for_update(&mut self, id: i64) -> Result<Option<CableBox>, StoreError> {
        Ok(self.tables.boxes.iter().find(|b| b.id == id).cloned())
    }

    fn box_view(&mut self, id: i64) -> Result<Option<BoxView>, StoreError> {
        match self.tables.boxes.iter().find(|b| b.id == id) {
            Some(b) => self.view(b).map(Some),
            None => Ok(None),
        }
    }

    fn box_by_number(&mut self, number: &str) -> Result<Option<BoxView>, StoreError> {
        match self.tables.boxes.iter().find(|b| b.number == number) {
            Some(b) => self.view(b).map(Some),
            None => Ok(None),
        }
    }

    fn boxes(&mut self) -> Result<Vec<BoxView>, StoreError> {
        let mut rows = self
            .tables
            .boxes
            .iter()
            .map(|b| self.view(b))
            .collect::<Result<Vec<_>, _>>()?;
        rows.sort_by(|a, b| {
            b.cable_box
                .created_at
                .cmp(&a.cable_box.created_at)
                .then(b.cable_box.id.cmp(&a.cable_box.id))
        });
        Ok(rows)
    }

    fn set_box_state(
        &mut self,
        id: i64,
        status: BoxStatus,
        current_quantity: Decimal,
    ) -> Result<CableBox, StoreError> {
        let row = self
            .tables
            .boxes
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| StoreError::Corrupt(format!("box {id} disappeared mid-transaction")))?;
        row.status = status;
        row.current_quantity = current_quantity;
        Ok(row.clone())
    }

    fn append_usage(&mut self, draft: &UsageDraft) -> Result<Usage, StoreError> {
        self.tables.last_id.usage += 1;
        let row = Usage {
            id: self.tables.last_id.usage,
            box_id: draft.box_id,
            project_id: draft.project_id,
            quantity_used: draft.quantity_used,
            technician: draft.technician.clone(),
            used_at: Utc::now(),
            notes: draft.notes.clone(),
        };
        self.tables.usages.push(row.clone());
        Ok(row)
    }

    fn usages_for_box(&mut self, box_id: i64) -> Result<Vec<Usage>, StoreError> {
        let mut rows: Vec<Usage> = self
            .tables
            .usages
            .iter()
            .filter(|u| u.box_id == box_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.used_at.cmp(&b.used_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    fn insert_project(&mut self, draft: &ProjectDraft) -> Result<Project, StoreError> {
        self.tables.last_id.project += 1;
        let row = Project {
            id: self.tables.last_id.project,
            name: draft.name.clone(),
            description: draft.description.clone(),
            status: draft.status.clone(),
            created_at: Utc::now(),
        };
        self.tables.projects.push(row.clone());
        Ok(row)
    }

    fn project(&mut self, id: i64) -> Result<Option<Project>, StoreError> {
        Ok(self.tables.projects.iter().find(|p| p.id == id).cloned())
    }

    fn projects(&mut self) -> Result<Vec<Project>, StoreError> {
        let mut rows = self.tables.projects.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }
}
