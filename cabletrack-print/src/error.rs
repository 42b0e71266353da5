//! Print-side error type.

use std::io;
use thiserror::Error;

/// Errors raised while rendering or sending a print job
#[derive(Debug, Error)]
pub enum PrintError {
    /// No driver is registered for the requested template language
    #[error("unsupported printer language: {0}")]
    UnsupportedDriver(String),
    /// The job itself is malformed (zero copies, unreadable body, ...)
    #[error("invalid print job: {0}")]
    InvalidJob(String),
    /// Writing to the printer sink failed
    #[error("printer i/o failed: {0}")]
    Io(#[from] io::Error),
}

impl PrintError {
    /// Machine-readable kind reported to callers
    pub fn kind(&self) -> &'static str {
        match self {
            PrintError::UnsupportedDriver(_) => "unsupported_driver",
            PrintError::InvalidJob(_) => "validation",
            PrintError::Io(_) => "internal",
        }
    }

    /// Message safe to hand to an untrusted caller
    pub fn public_message(&self) -> String {
        match self {
            PrintError::Io(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}
