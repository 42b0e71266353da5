//! Print jobs: render once, send N copies.

use crate::error::PrintError;
use crate::registry::DriverRegistry;
use crate::template::TemplateData;
use serde::{Deserialize, Serialize};

/// Largest batch a single request may ask for
pub const MAX_COPIES: u32 = 100;

fn one() -> u32 {
    1
}

/// A request to print a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintJob {
    /// Driver language tag, e.g. `TSPL`
    pub language: String,
    /// Template body with `{{ name }}` placeholders
    pub template: String,
    #[serde(default)]
    pub data: TemplateData,
    #[serde(default = "one")]
    pub copies: u32,
}

/// Outcome of a successful job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintReceipt {
    pub status: String,
    pub copies: u32,
}

/// Render `job` with the driver for its language and send it `copies` times
///
/// # Errors
///
/// * `InvalidJob` when `copies` is zero or above [`MAX_COPIES`]
/// * `UnsupportedDriver` when the language has no driver
/// * `Io` when the printer sink rejects a write
pub fn print(registry: &DriverRegistry, job: &PrintJob) -> Result<PrintReceipt, PrintError> {
    if job.copies == 0 || job.copies > MAX_COPIES {
        return Err(PrintError::InvalidJob(format!(
            "copies must be between 1 and {MAX_COPIES}, got {}",
            job.copies
        )));
    }
    let driver = registry.get(&job.language)?;
    let command = driver.render(&job.template, &job.data);
    for copy in 1..=job.copies {
        driver.send(&command)?;
        log::debug!("sent copy {copy}/{} via {}", job.copies, driver.language());
    }
    log::info!("printed {} label(s) via {}", job.copies, driver.language());
    Ok(PrintReceipt {
        status: "sent".to_string(),
        copies: job.copies,
    })
}
