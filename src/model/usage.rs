use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One consumption event; never updated or deleted once written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub id: i64,
    pub box_id: i64,
    pub project_id: i64,
    pub quantity_used: Decimal,
    pub technician: String,
    pub used_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Usage row as appended by a box close
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageDraft {
    pub box_id: i64,
    pub project_id: i64,
    pub quantity_used: Decimal,
    pub technician: String,
    pub notes: Option<String>,
}
