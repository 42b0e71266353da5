//! Label printing for cabletrack.
//!
//! Templates are plain printer command text with `{{ name }}` placeholders.
//! A [`DriverRegistry`] maps a template language (only `TSPL` ships today)
//! to a [`PrinterDriver`] that renders and sends the command. The ledger
//! service uses [`render`] to build label artifacts; the `cabletrack-print`
//! binary exposes [`job::print`] over HTTP next to the printer.

pub mod driver;
pub mod error;
pub mod job;
pub mod registry;
pub mod server;
pub mod template;

pub use driver::{PrinterDriver, TsplDriver};
pub use error::PrintError;
pub use job::{print, PrintJob, PrintReceipt};
pub use registry::DriverRegistry;
pub use template::{placeholders, render, TemplateData};
