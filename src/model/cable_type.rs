use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unit recorded when a cable type is created without one
pub const DEFAULT_UNIT: &str = "meters";

/// Longest accepted numbering prefix
pub const MAX_PREFIX_LEN: usize = 16;

/// A category of cable stock and the prefix its box numbers carry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CableType {
    pub id: i64,
    pub name: String,
    pub prefix: String,
    pub description: Option<String>,
    pub unit: String,
    pub created_at: DateTime<Utc>,
}

/// Create-cable-type request body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCableType {
    pub name: String,
    pub prefix: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Validated row ready for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CableTypeDraft {
    pub name: String,
    pub prefix: String,
    pub description: Option<String>,
    pub unit: String,
}

impl NewCableType {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn validate(self) -> Result<CableTypeDraft, LedgerError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(LedgerError::validation("cable type name is required"));
        }
        let unit = self
            .unit
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_UNIT.to_string());
        Ok(CableTypeDraft {
            name,
            prefix: normalize_prefix(&self.prefix)?,
            description: non_blank(self.description),
            unit,
        })
    }
}

/// Trim and upper-case a prefix, rejecting anything but 1..=16 ASCII alphanumerics
pub fn normalize_prefix(raw: &str) -> Result<String, LedgerError> {
    let prefix = raw.trim().to_ascii_uppercase();
    if prefix.is_empty() {
        return Err(LedgerError::validation("cable type prefix is required"));
    }
    if prefix.len() > MAX_PREFIX_LEN {
        return Err(LedgerError::validation(format!(
            "cable type prefix must be at most {MAX_PREFIX_LEN} characters"
        )));
    }
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LedgerError::validation(
            "cable type prefix must be letters and digits only",
        ));
    }
    Ok(prefix)
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
