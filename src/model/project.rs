use super::cable_type::non_blank;
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status given to projects created without one
pub const DEFAULT_STATUS: &str = "active";

/// A job that consumption is charged to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDraft {
    pub name: String,
    pub description: Option<String>,
    pub status: String,
}

impl NewProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(self) -> Result<ProjectDraft, LedgerError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(LedgerError::validation("project name is required"));
        }
        Ok(ProjectDraft {
            name,
            description: non_blank(self.description),
            status: non_blank(self.status).unwrap_or_else(|| DEFAULT_STATUS.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let draft = NewProject::new(" Hospital wing B ").validate().unwrap();
        assert_eq!(draft.name, "Hospital wing B");
        assert_eq!(draft.status, DEFAULT_STATUS);
    }

    #[test]
    fn test_name_required() {
        assert!(NewProject::new("").validate().is_err());
    }
}
