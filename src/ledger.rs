//! The box ledger: creation, open/close transitions and consumption.

use crate::error::LedgerError;
use crate::labels::{LabelArtifact, LabelIssuer};
use crate::minter;
use crate::model::{quantity, BoxDraft, BoxView, CableBox, CloseBox, CloseReceipt, NewBox, Usage, UsageDraft};
use crate::store::Store;
use crate::usage_log;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

pub struct BoxLedger<S> {
    store: Arc<S>,
    issuer: Arc<dyn LabelIssuer>,
}

impl<S: Store> BoxLedger<S> {
    pub fn new(store: Arc<S>, issuer: Arc<dyn LabelIssuer>) -> Self {
        Self { store, issuer }
    }

    /// Mint a number and store a new box holding `initial_quantity`
    ///
    /// The label is issued afterwards; a label failure is logged and never
    /// undoes the box.
    pub fn create(&self, request: NewBox) -> Result<CableBox, LedgerError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::ledger_span("box.create").entered();

        let initial_quantity =
            quantity::validate("initial_quantity", request.initial_quantity, false)?;

        let created = self.store.transaction(|tx| {
            let cable_type = tx
                .cable_type(request.cable_type_id)?
                .ok_or_else(|| LedgerError::not_found("cable type", request.cable_type_id))?;
            let number = minter::next_number(tx, &cable_type.prefix)?;
            Ok(tx.insert_box(&BoxDraft {
                number,
                cable_type_id: cable_type.id,
                initial_quantity,
            })?)
        })?;

        log::info!(
            "created box {} id={} with {}",
            created.number,
            created.id,
            created.initial_quantity
        );
        #[cfg(feature = "metrics")]
        crate::metrics::METRICS.record_box_created();

        if let Err(e) = self.issuer.issue(&created.number) {
            log::warn!("label for box {} not issued: {e}", created.number);
            #[cfg(feature = "metrics")]
            crate::metrics::METRICS.record_label_failure();
        }
        Ok(created)
    }

    /// Move a `new` or `closed` box to `open`
    pub fn open(&self, box_id: i64) -> Result<CableBox, LedgerError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::ledger_span("box.open").entered();

        let opened = self.store.transaction(|tx| {
            let current = tx
                .box_for_update(box_id)?
                .ok_or_else(|| LedgerError::not_found("box", box_id))?;
            let status = current.plan_open()?;
            Ok(tx.set_box_state(box_id, status, current.current_quantity)?)
        })?;

        log::info!("opened box {}", opened.number);
        Ok(opened)
    }

    /// Record what is left in a box and charge the difference to a project
    ///
    /// Balance update and usage record are written together or not at all.
    /// A missing box is reported before anything wrong with the request.
    pub fn close(&self, box_id: i64, request: CloseBox) -> Result<CloseReceipt, LedgerError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::ledger_span("box.close").entered();

        let (cable_box, usage) = self.store.transaction(|tx| {
            let current = tx
                .box_for_update(box_id)?
                .ok_or_else(|| LedgerError::not_found("box", box_id))?;
            let request = request.validate()?;
            let plan = current.plan_close(request.final_quantity)?;
            if tx.project(request.project_id)?.is_none() {
                return Err(LedgerError::not_found("project", request.project_id));
            }

            let updated = tx.set_box_state(box_id, plan.status, plan.current_quantity)?;
            let usage = usage_log::append(
                tx,
                &UsageDraft {
                    box_id,
                    project_id: request.project_id,
                    quantity_used: plan.quantity_used,
                    technician: request.technician.clone(),
                    notes: request.notes.clone(),
                },
            )?;
            Ok((updated, usage))
        })?;

        #[cfg(feature = "metrics")]
        crate::metrics::METRICS.record_usage();
        log::info!(
            "closed box {} as {}: used {} for project {} (usage id={})",
            cable_box.number,
            cable_box.status,
            usage.quantity_used,
            usage.project_id,
            usage.id
        );
        Ok(CloseReceipt {
            quantity_used: usage.quantity_used,
            status: cable_box.status,
            current_quantity: cable_box.current_quantity,
            usage_id: usage.id,
        })
    }

    /// Look a box up by number, ignoring case
    pub fn find_by_number(&self, number: &str) -> Result<BoxView, LedgerError> {
        let number = number.trim().to_ascii_uppercase();
        self.store.transaction(|tx| {
            tx.box_by_number(&number)?
                .ok_or_else(|| LedgerError::not_found("box", &number))
        })
    }

    pub fn get(&self, box_id: i64) -> Result<BoxView, LedgerError> {
        self.store.transaction(|tx| {
            tx.box_view(box_id)?
                .ok_or_else(|| LedgerError::not_found("box", box_id))
        })
    }

    /// Every box, newest first, with its cable type
    pub fn list(&self) -> Result<Vec<BoxView>, LedgerError> {
        self.store.transaction(|tx| Ok(tx.boxes()?))
    }

    pub fn usage_history(&self, box_id: i64) -> Result<Vec<Usage>, LedgerError> {
        usage_log::history(self.store.as_ref(), box_id)
    }

    /// Label for an existing box (served from the label cache when present)
    pub fn label(&self, box_id: i64) -> Result<LabelArtifact, LedgerError> {
        let view = self.get(box_id)?;
        Ok(self.issuer.issue(&view.cable_box.number)?)
    }
}
