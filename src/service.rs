//! The inventory service: registries and ledger over one shared store.

use crate::labels::LabelIssuer;
use crate::ledger::BoxLedger;
use crate::registry::{CableTypeRegistry, ProjectRegistry};
use crate::store::Store;
use std::sync::Arc;

pub struct Inventory<S> {
    inner: Arc<Components<S>>,
}

struct Components<S> {
    cable_types: CableTypeRegistry<S>,
    projects: ProjectRegistry<S>,
    ledger: BoxLedger<S>,
}

impl<S: Store> Inventory<S> {
    pub fn new(store: S, issuer: Arc<dyn LabelIssuer>) -> Self {
        let store = Arc::new(store);
        Self {
            inner: Arc::new(Components {
                cable_types: CableTypeRegistry::new(store.clone()),
                projects: ProjectRegistry::new(store.clone()),
                ledger: BoxLedger::new(store, issuer),
            }),
        }
    }

    pub fn cable_types(&self) -> &CableTypeRegistry<S> {
        &self.inner.cable_types
    }

    pub fn projects(&self) -> &ProjectRegistry<S> {
        &self.inner.projects
    }

    pub fn ledger(&self) -> &BoxLedger<S> {
        &self.inner.ledger
    }
}

// Derived Clone would require `S: Clone`.
impl<S> Clone for Inventory<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
