//! Language tag → driver lookup.

use crate::driver::PrinterDriver;
use crate::error::PrintError;
use std::collections::HashMap;
use std::sync::Arc;

/// Registered printer drivers, keyed by upper-cased language tag
#[derive(Default, Clone)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn PrinterDriver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`register`](Self::register)
    pub fn with_driver(mut self, driver: Arc<dyn PrinterDriver>) -> Self {
        self.register(driver);
        self
    }

    /// Register a driver under its language tag, returning any driver it replaces
    pub fn register(&mut self, driver: Arc<dyn PrinterDriver>) -> Option<Arc<dyn PrinterDriver>> {
        let tag = driver.language().to_ascii_uppercase();
        log::debug!("registered printer driver {tag}");
        self.drivers.insert(tag, driver)
    }

    /// Resolve a driver by language tag (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns `PrintError::UnsupportedDriver` when no driver is registered for the tag.
    pub fn get(&self, language: &str) -> Result<Arc<dyn PrinterDriver>, PrintError> {
        self.drivers
            .get(&language.trim().to_ascii_uppercase())
            .cloned()
            .ok_or_else(|| PrintError::UnsupportedDriver(language.to_string()))
    }

    /// Registered tags, sorted
    pub fn languages(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.drivers.keys().cloned().collect();
        tags.sort();
        tags
    }
}
