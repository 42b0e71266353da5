//! Cable type and project registries.

use crate::error::LedgerError;
use crate::model::{CableType, NewCableType, NewProject, Project};
use crate::store::{Store, StoreError, PREFIX_CONSTRAINT};
use std::sync::Arc;

pub struct CableTypeRegistry<S> {
    store: Arc<S>,
}

impl<S: Store> CableTypeRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Register a cable type; its prefix is upper-cased and must be unused
    pub fn create(&self, request: NewCableType) -> Result<CableType, LedgerError> {
        let draft = request.validate()?;
        let duplicate = || {
            LedgerError::validation(format!("cable type prefix {} already exists", draft.prefix))
        };

        let created = self.store.transaction(|tx| {
            if tx.cable_type_by_prefix(&draft.prefix)?.is_some() {
                return Err(duplicate());
            }
            match tx.insert_cable_type(&draft) {
                Ok(row) => Ok(row),
                // Lost a race with a concurrent create of the same prefix.
                Err(StoreError::Conflict { constraint }) if constraint == PREFIX_CONSTRAINT => {
                    Err(duplicate())
                }
                Err(e) => Err(e.into()),
            }
        })?;

        log::info!(
            "created cable type {} ({}) id={}",
            created.name,
            created.prefix,
            created.id
        );
        Ok(created)
    }

    /// All cable types by name
    pub fn list(&self) -> Result<Vec<CableType>, LedgerError> {
        self.store.transaction(|tx| Ok(tx.cable_types()?))
    }
}

pub struct ProjectRegistry<S> {
    store: Arc<S>,
}

impl<S: Store> ProjectRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create(&self, request: NewProject) -> Result<Project, LedgerError> {
        let draft = request.validate()?;
        let created = self
            .store
            .transaction(|tx| Ok(tx.insert_project(&draft)?))?;
        log::info!("created project {} id={}", created.name, created.id);
        Ok(created)
    }

    /// All projects by name
    pub fn list(&self) -> Result<Vec<Project>, LedgerError> {
        self.store.transaction(|tx| Ok(tx.projects()?))
    }
}
