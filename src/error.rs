//! Ledger error type and the kinds reported to callers.

use crate::labels::LabelError;
use crate::model::BoxStatus;
use crate::store::StoreError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// What went wrong, as seen by a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidTransition,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error("cannot {action} box {number} while it is {from}")]
    InvalidTransition {
        number: String,
        from: BoxStatus,
        action: &'static str,
    },

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    #[error("label issuance failed: {0}")]
    Label(#[from] LabelError),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            LedgerError::Store(_) | LedgerError::Label(_) => ErrorKind::Internal,
        }
    }

    /// Message for the caller; internal detail stays in the server log
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "internal error".to_string(),
            _ => self.to_string(),
        }
    }
}
