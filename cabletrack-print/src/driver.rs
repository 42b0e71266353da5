//! Printer drivers.

use crate::error::PrintError;
use crate::template::{self, TemplateData};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

/// A printer protocol: turns a template into a command and ships it
pub trait PrinterDriver: Send + Sync {
    /// Template language tag this driver answers to (e.g. `TSPL`)
    fn language(&self) -> &str;

    /// Render a template into a printer command
    fn render(&self, template: &str, data: &TemplateData) -> String {
        template::render(template, data)
    }

    /// Send a rendered command to the printer
    fn send(&self, command: &str) -> Result<(), PrintError>;
}

/// Driver for TSC thermal label printers speaking TSPL
///
/// Commands are written to a byte sink: a device node such as `/dev/usb/lp0`,
/// a spool file, or stdout.
pub struct TsplDriver {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl TsplDriver {
    pub const LANGUAGE: &'static str = "TSPL";

    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Write commands to standard output
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Write commands to a device node or spool file
    pub fn open_device(path: &Path) -> Result<Self, PrintError> {
        let device = OpenOptions::new().append(true).create(true).open(path)?;
        Ok(Self::new(Box::new(device)))
    }
}

impl PrinterDriver for TsplDriver {
    fn language(&self) -> &str {
        Self::LANGUAGE
    }

    fn send(&self, command: &str) -> Result<(), PrintError> {
        let mut sink = self
            .sink
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "printer sink lock poisoned"))?;
        sink.write_all(command.as_bytes())?;
        // TSPL is line oriented; an unterminated final command is never executed.
        if !command.ends_with('\n') {
            sink.write_all(b"\r\n")?;
        }
        sink.flush()?;
        Ok(())
    }
}
