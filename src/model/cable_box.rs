//! Boxes (spools) and their lifecycle.
//!
//! ```text
//!            open              close(final > 0)
//!   new ─────────► open ──────────────────────► closed
//!    │              │ ▲                            │
//!    │              │ └──────────── open ──────────┘
//!    │              │ close(final = 0)
//!    └── close ─────┴────────────────────────────► exhausted (terminal)
//! ```
//!
//! `close` is accepted from `new`, `open` and `closed`; nothing leaves
//! `exhausted`.

use super::quantity;
use super::cable_type::non_blank;
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxStatus {
    New,
    Open,
    Closed,
    Exhausted,
}

impl BoxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BoxStatus::New => "new",
            BoxStatus::Open => "open",
            BoxStatus::Closed => "closed",
            BoxStatus::Exhausted => "exhausted",
        }
    }

    pub fn can_open(self) -> bool {
        matches!(self, BoxStatus::New | BoxStatus::Closed)
    }

    pub fn can_close(self) -> bool {
        !matches!(self, BoxStatus::Exhausted)
    }

    /// Status a close leaves behind for the given remaining quantity
    pub fn after_close(remaining: Decimal) -> Self {
        if remaining <= Decimal::ZERO {
            BoxStatus::Exhausted
        } else {
            BoxStatus::Closed
        }
    }
}

impl fmt::Display for BoxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoxStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(BoxStatus::New),
            "open" => Ok(BoxStatus::Open),
            "closed" => Ok(BoxStatus::Closed),
            "exhausted" => Ok(BoxStatus::Exhausted),
            other => Err(format!("unknown box status '{other}'")),
        }
    }
}

/// A box of cable stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CableBox {
    pub id: i64,
    pub number: String,
    pub cable_type_id: i64,
    pub initial_quantity: Decimal,
    pub current_quantity: Decimal,
    pub status: BoxStatus,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a close, computed before anything is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consumption {
    pub quantity_used: Decimal,
    pub current_quantity: Decimal,
    pub status: BoxStatus,
}

impl CableBox {
    /// Status after an `open`, or why it is refused
    pub fn plan_open(&self) -> Result<BoxStatus, LedgerError> {
        if !self.status.can_open() {
            return Err(self.refuse("open"));
        }
        Ok(BoxStatus::Open)
    }

    /// Work out a close down to `final_quantity` remaining
    ///
    /// The final quantity must already be validated as a non-negative
    /// quantity. Overshooting the current balance is refused, not clamped.
    pub fn plan_close(&self, final_quantity: Decimal) -> Result<Consumption, LedgerError> {
        if !self.status.can_close() {
            return Err(self.refuse("close"));
        }
        if final_quantity > self.current_quantity {
            return Err(LedgerError::validation(format!(
                "final quantity {} exceeds current quantity {} of box {}",
                final_quantity.normalize(),
                self.current_quantity.normalize(),
                self.number
            )));
        }
        Ok(Consumption {
            quantity_used: (self.current_quantity - final_quantity).normalize(),
            current_quantity: final_quantity,
            status: BoxStatus::after_close(final_quantity),
        })
    }

    fn refuse(&self, action: &'static str) -> LedgerError {
        LedgerError::InvalidTransition {
            number: self.number.clone(),
            from: self.status,
            action,
        }
    }
}

/// Box row ready for insertion; `current_quantity` starts at `initial_quantity`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxDraft {
    pub number: String,
    pub cable_type_id: i64,
    pub initial_quantity: Decimal,
}

/// A box joined with its cable type's name and prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoxView {
    #[serde(flatten)]
    pub cable_box: CableBox,
    pub cable_type_name: String,
    pub prefix: String,
}

/// Create-box request body
#[derive(Debug, Clone, Deserialize)]
pub struct NewBox {
    pub cable_type_id: i64,
    pub initial_quantity: Decimal,
}

impl NewBox {
    pub fn new(cable_type_id: i64, initial_quantity: Decimal) -> Self {
        Self {
            cable_type_id,
            initial_quantity,
        }
    }
}

/// Close-box request body
#[derive(Debug, Clone, Deserialize)]
pub struct CloseBox {
    pub final_quantity: Decimal,
    pub project_id: i64,
    pub technician: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CloseBox {
    pub fn new(final_quantity: Decimal, project_id: i64, technician: impl Into<String>) -> Self {
        Self {
            final_quantity,
            project_id,
            technician: technician.into(),
            notes: None,
        }
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Trimmed technician, normalized quantity, blank notes dropped
    pub(crate) fn validate(self) -> Result<CloseBox, LedgerError> {
        let technician = self.technician.trim().to_string();
        if technician.is_empty() {
            return Err(LedgerError::validation("technician is required"));
        }
        Ok(CloseBox {
            final_quantity: quantity::validate("final_quantity", self.final_quantity, true)?,
            project_id: self.project_id,
            technician,
            notes: non_blank(self.notes),
        })
    }
}

/// What a close reports back
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloseReceipt {
    pub quantity_used: Decimal,
    pub status: BoxStatus,
    pub current_quantity: Decimal,
    pub usage_id: i64,
}
