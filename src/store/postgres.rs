//! PostgreSQL store.
//!
//! One pooled connection and one `READ COMMITTED` transaction per logical
//! operation. Box numbering is serialized with a transaction-scoped advisory
//! lock per prefix, and box updates read the row `FOR UPDATE`.

use super::{Store, StoreError, StoreTx};
use crate::error::LedgerError;
use crate::executor::Executor;
use crate::model::{
    BoxDraft, BoxStatus, BoxView, CableBox, CableType, CableTypeDraft, Project, ProjectDraft,
    Usage, UsageDraft,
};
use crate::pool::ConnectionPool;
use crate::transaction::{IsolationLevel, Transaction};
use may_postgres::types::{FromSql, ToSql};
use may_postgres::Row;
use rust_decimal::Decimal;
use sea_query::{Expr, JoinType, Order, PostgresQueryBuilder, Query, SelectStatement};

const CABLE_TYPE_COLUMNS: &str = "id, name, prefix, description, unit, created_at";
const BOX_COLUMNS: &str =
    "id, number, cable_type_id, initial_quantity, current_quantity, status, created_at";
const USAGE_COLUMNS: &str = "id, box_id, project_id, quantity_used, technician, used_at, notes";
const PROJECT_COLUMNS: &str = "id, name, description, status, created_at";

/// Store backed by a [`ConnectionPool`]
#[derive(Clone)]
pub struct PgStore {
    pool: ConnectionPool,
}

impl PgStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

impl Store for PgStore {
    fn transaction<T, F>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, LedgerError>,
    {
        let conn = self.pool.acquire().map_err(StoreError::from)?;
        let txn = Transaction::begin(&conn, IsolationLevel::ReadCommitted)
            .map_err(StoreError::from)?;

        let result = f(&mut PgTx { txn: &txn });
        match result {
            Ok(out) => {
                txn.commit().map_err(StoreError::from)?;
                Ok(out)
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback() {
                    log::warn!("rollback after failed operation also failed: {rollback}");
                }
                Err(e)
            }
        }
    }
}

struct PgTx<'t, 'c> {
    txn: &'t Transaction<'c>,
}

fn column<'r, T: FromSql<'r>>(row: &'r Row, name: &str) -> Result<T, StoreError> {
    row.try_get(name)
        .map_err(|e| StoreError::Corrupt(format!("column {name}: {e}")))
}

fn decimal(row: &Row, name: &str) -> Result<Decimal, StoreError> {
    let value: Decimal = column(row, name)?;
    Ok(value.normalize())
}

fn cable_type_from_row(row: &Row) -> Result<CableType, StoreError> {
    Ok(CableType {
        id: column(row, "id")?,
        name: column(row, "name")?,
        prefix: column(row, "prefix")?,
        description: column(row, "description")?,
        unit: column(row, "unit")?,
        created_at: column(row, "created_at")?,
    })
}

fn box_from_row(row: &Row) -> Result<CableBox, StoreError> {
    let status: String = column(row, "status")?;
    Ok(CableBox {
        id: column(row, "id")?,
        number: column(row, "number")?,
        cable_type_id: column(row, "cable_type_id")?,
        initial_quantity: decimal(row, "initial_quantity")?,
        current_quantity: decimal(row, "current_quantity")?,
        status: status.parse::<BoxStatus>().map_err(StoreError::Corrupt)?,
        created_at: column(row, "created_at")?,
    })
}

fn box_view_from_row(row: &Row) -> Result<BoxView, StoreError> {
    Ok(BoxView {
        cable_box: box_from_row(row)?,
        cable_type_name: column(row, "cable_type_name")?,
        prefix: column(row, "prefix")?,
    })
}

fn usage_from_row(row: &Row) -> Result<Usage, StoreError> {
    Ok(Usage {
        id: column(row, "id")?,
        box_id: column(row, "box_id")?,
        project_id: column(row, "project_id")?,
        quantity_used: decimal(row, "quantity_used")?,
        technician: column(row, "technician")?,
        used_at: column(row, "used_at")?,
        notes: column(row, "notes")?,
    })
}

fn project_from_row(row: &Row) -> Result<Project, StoreError> {
    Ok(Project {
        id: column(row, "id")?,
        name: column(row, "name")?,
        description: column(row, "description")?,
        status: column(row, "status")?,
        created_at: column(row, "created_at")?,
    })
}

/// Boxes joined with their cable type, newest first
pub(crate) fn box_view_select() -> SelectStatement {
    let mut query = Query::select();
    query
        .columns([
            ("b", "id"),
            ("b", "number"),
            ("b", "cable_type_id"),
            ("b", "initial_quantity"),
            ("b", "current_quantity"),
            ("b", "status"),
            ("b", "created_at"),
            ("t", "prefix"),
        ])
        .expr_as(Expr::col(("t", "name")), "cable_type_name")
        .from_as("boxes", "b")
        .join_as(
            JoinType::InnerJoin,
            "cable_types",
            "t",
            Expr::cust("t.id = b.cable_type_id"),
        )
        .order_by(("b", "created_at"), Order::Desc)
        .order_by(("b", "id"), Order::Desc);
    query
}

fn box_view_sql(filter: Option<&str>) -> String {
    let mut query = box_view_select();
    if let Some(filter) = filter {
        query.and_where(Expr::cust(filter.to_string()));
    }
    let (sql, _) = query.build(PostgresQueryBuilder);
    sql
}

impl PgTx<'_, '_> {
    fn one_view(&self, filter: &str, key: &dyn ToSql) -> Result<Option<BoxView>, StoreError> {
        self.txn
            .query_opt(&box_view_sql(Some(filter)), &[key])?
            .as_ref()
            .map(box_view_from_row)
            .transpose()
    }
}

impl StoreTx for PgTx<'_, '_> {
    fn insert_cable_type(&mut self, draft: &CableTypeDraft) -> Result<CableType, StoreError> {
        let sql = format!(
            "INSERT INTO cable_types (name, prefix, description, unit) \
             VALUES ($1, $2, $3, $4) RETURNING {CABLE_TYPE_COLUMNS}"
        );
        let row = self.txn.query_one(
            &sql,
            &[&draft.name, &draft.prefix, &draft.description, &draft.unit],
        )?;
        cable_type_from_row(&row)
    }

    fn cable_type(&mut self, id: i64) -> Result<Option<CableType>, StoreError> {
        let sql = format!("SELECT {CABLE_TYPE_COLUMNS} FROM cable_types WHERE id = $1");
        self.txn
            .query_opt(&sql, &[&id])?
            .as_ref()
            .map(cable_type_from_row)
            .transpose()
    }

    fn cable_type_by_prefix(&mut self, prefix: &str) -> Result<Option<CableType>, StoreError> {
        let sql = format!("SELECT {CABLE_TYPE_COLUMNS} FROM cable_types WHERE prefix = $1");
        self.txn
            .query_opt(&sql, &[&prefix])?
            .as_ref()
            .map(cable_type_from_row)
            .transpose()
    }

    fn cable_types(&mut self) -> Result<Vec<CableType>, StoreError> {
        let sql = format!("SELECT {CABLE_TYPE_COLUMNS} FROM cable_types ORDER BY name, id");
        self.txn
            .query_all(&sql, &[])?
            .iter()
            .map(cable_type_from_row)
            .collect()
    }

    fn lock_prefix(&mut self, prefix: &str) -> Result<(), StoreError> {
        let key = format!("box-number:{prefix}");
        self.txn
            .execute("SELECT pg_advisory_xact_lock(hashtext($1))", &[&key])?;
        Ok(())
    }

    fn count_numbered_boxes(&mut self, prefix: &str) -> Result<i64, StoreError> {
        let row = self.txn.query_one(
            "SELECT COUNT(*) FROM boxes b \
             JOIN cable_types t ON t.id = b.cable_type_id \
             WHERE t.prefix = $1 AND b.number ~ ('^' || $1 || '[0-9]+$')",
            &[&prefix],
        )?;
        column(&row, "count")
    }

    fn insert_box(&mut self, draft: &BoxDraft) -> Result<CableBox, StoreError> {
        let sql = format!(
            "INSERT INTO boxes (number, cable_type_id, initial_quantity, current_quantity, status) \
             VALUES ($1, $2, $3, $3, 'new') RETURNING {BOX_COLUMNS}"
        );
        let row = self.txn.query_one(
            &sql,
            &[&draft.number, &draft.cable_type_id, &draft.initial_quantity],
        )?;
        box_from_row(&row)
    }

    fn box_for_update(&mut self, id: i64) -> Result<Option<CableBox>, StoreError> {
        let sql = format!("SELECT {BOX_COLUMNS} FROM boxes WHERE id = $1 FOR UPDATE");
        self.txn
            .query_opt(&sql, &[&id])?
            .as_ref()
            .map(box_from_row)
            .transpose()
    }

    fn box_view(&mut self, id: i64) -> Result<Option<BoxView>, StoreError> {
        self.one_view("b.id = $1", &id)
    }

    fn box_by_number(&mut self, number: &str) -> Result<Option<BoxView>, StoreError> {
        self.one_view("b.number = $1", &number)
    }

    fn boxes(&mut self) -> Result<Vec<BoxView>, StoreError> {
        self.txn
            .query_all(&box_view_sql(None), &[])?
            .iter()
            .map(box_view_from_row)
            .collect()
    }

    fn set_box_state(
        &mut self,
        id: i64,
        status: BoxStatus,
        current_quantity: Decimal,
    ) -> Result<CableBox, StoreError> {
        let sql = format!(
            "UPDATE boxes SET status = $2, current_quantity = $3 WHERE id = $1 \
             RETURNING {BOX_COLUMNS}"
        );
        match self
            .txn
            .query_opt(&sql, &[&id, &status.as_str(), &current_quantity])?
        {
            Some(row) => box_from_row(&row),
            None => Err(StoreError::Corrupt(format!(
                "box {id} disappeared mid-transaction"
            ))),
        }
    }

    fn append_usage(&mut self, draft: &UsageDraft) -> Result<Usage, StoreError> {
        let sql = format!(
            "INSERT INTO usages (box_id, project_id, quantity_used, technician, notes) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USAGE_COLUMNS}"
        );
        let row = self.txn.query_one(
            &sql,
            &[
                &draft.box_id,
                &draft.project_id,
                &draft.quantity_used,
                &draft.technician,
                &draft.notes,
            ],
        )?;
        usage_from_row(&row)
    }

    fn usages_for_box(&mut self, box_id: i64) -> Result<Vec<Usage>, StoreError> {
        let sql =
            format!("SELECT {USAGE_COLUMNS} FROM usages WHERE box_id = $1 ORDER BY used_at, id");
        self.txn
            .query_all(&sql, &[&box_id])?
            .iter()
            .map(usage_from_row)
            .collect()
    }

    fn insert_project(&mut self, draft: &ProjectDraft) -> Result<Project, StoreError> {
        let sql = format!(
            "INSERT INTO projects (name, description, status) VALUES ($1, $2, $3) \
             RETURNING {PROJECT_COLUMNS}"
        );
        let row = self.txn.query_one(
            &sql,
            &[&draft.name, &draft.description, &draft.status],
        )?;
        project_from_row(&row)
    }

    fn project(&mut self, id: i64) -> Result<Option<Project>, StoreError> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        self.txn
            .query_opt(&sql, &[&id])?
            .as_ref()
            .map(project_from_row)
            .transpose()
    }

    fn projects(&mut self) -> Result<Vec<Project>, StoreError> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY name, id");
        self.txn
            .query_all(&sql, &[])?
            .iter()
            .map(project_from_row)
            .collect()
    }
}
