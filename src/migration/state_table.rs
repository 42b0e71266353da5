//! `cabletrack_migrations`: which migrations have been applied.

use crate::executor::{DbError, Executor};
use chrono::{DateTime, Utc};
use sea_query::{ColumnDef, Expr, PostgresQueryBuilder, Table, TableCreateStatement};

pub const STATE_TABLE: &str = "cabletrack_migrations";

/// An applied migration as recorded in the state table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: i64,
    pub name: String,
    pub checksum: String,
    pub applied_at: DateTime<Utc>,
    pub execution_time_ms: i64,
}

pub fn create_state_table() -> TableCreateStatement {
    Table::create()
        .table(STATE_TABLE)
        .if_not_exists()
        .col(ColumnDef::new("version").big_integer().not_null().primary_key())
        .col(ColumnDef::new("name").string_len(255).not_null())
        .col(ColumnDef::new("checksum").string_len(64).not_null())
        .col(
            ColumnDef::new("applied_at")
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(ColumnDef::new("execution_time_ms").big_integer().not_null())
        .to_owned()
}

pub fn initialize(executor: &dyn Executor) -> Result<(), DbError> {
    let sql = create_state_table().build(PostgresQueryBuilder);
    executor.execute(&sql, &[])?;
    Ok(())
}

/// Applied migrations in version order
pub fn applied(executor: &dyn Executor) -> Result<Vec<AppliedMigration>, DbError> {
    let sql = format!(
        "SELECT version, name, checksum, applied_at, execution_time_ms FROM {STATE_TABLE} ORDER BY version"
    );
    executor
        .query_all(&sql, &[])?
        .iter()
        .map(|row| -> Result<AppliedMigration, DbError> {
            Ok(AppliedMigration {
                version: row.try_get("version")?,
                name: row.try_get("name")?,
                checksum: row.try_get("checksum")?,
                applied_at: row.try_get("applied_at")?,
                execution_time_ms: row.try_get("execution_time_ms")?,
            })
        })
        .collect()
}

pub fn record(
    executor: &dyn Executor,
    version: i64,
    name: &str,
    checksum: &str,
    execution_time_ms: i64,
) -> Result<(), DbError> {
    let sql = format!(
        "INSERT INTO {STATE_TABLE} (version, name, checksum, execution_time_ms) VALUES ($1, $2, $3, $4)"
    );
    executor.execute(&sql, &[&version, &name, &checksum, &execution_time_ms])?;
    Ok(())
}
