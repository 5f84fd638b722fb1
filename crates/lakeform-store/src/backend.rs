//! Lakehouse source and sink contracts.
//!
//! The engine reads through [`LakehouseSource`] and writes through
//! [`LakehouseSink`]. Keeping them separate lets a run read from one
//! lakehouse and land in another, and lets tests fake either side.

use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use lakeform_types::WriteMode;

use crate::error::{self, StoreError};

/// Read access to a lakehouse.
///
/// Implementations must be `Send + Sync` for use behind `Arc<dyn LakehouseSource>`.
pub trait LakehouseSource: Send + Sync {
    /// Full schema of `table`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownTable`] when the table does not exist.
    fn table_schema(&self, table: &str) -> error::Result<SchemaRef>;

    /// Read `columns` of `table`, in the requested order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownTable`] or [`StoreError::UnknownColumn`]
    /// when the table or a column cannot be found.
    fn read_table(&self, table: &str, columns: &[String]) -> error::Result<RecordBatch>;
}

/// Write access to a lakehouse.
///
/// A write either lands completely or fails; callers never observe a
/// partially written table.
pub trait LakehouseSink: Send + Sync {
    /// Schema of an existing target table, `None` if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on storage failure.
    fn target_schema(&self, table: &str) -> error::Result<Option<SchemaRef>>;

    /// Write `batch` to `table` using `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WriteConflict`] when an append does not match
    /// the existing table, or another [`StoreError`] on storage failure.
    fn write_table(
        &self,
        batch: &RecordBatch,
        table: &str,
        mode: WriteMode,
    ) -> error::Result<WriteSummary>;
}

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub table: String,
    pub mode: WriteMode,
    /// Rows contributed by this write.
    pub rows_written: u64,
    /// Rows in the table after the write.
    pub total_rows: u64,
}

/// Select `columns` from `batch` in the requested order.
///
/// # Errors
///
/// Returns [`StoreError::UnknownColumn`] for the first missing column.
pub fn project_columns(batch: &RecordBatch, table: &str, columns: &[String]) -> error::Result<RecordBatch> {
    let schema = batch.schema();
    let indices = columns
        .iter()
        .map(|column| {
            schema
                .index_of(column)
                .map_err(|_| StoreError::UnknownColumn {
                    table: table.to_string(),
                    column: column.clone(),
                })
        })
        .collect::<error::Result<Vec<_>>>()?;
    Ok(batch.project(&indices)?)
}

/// Check that `incoming` can be appended to a table whose schema is `existing`.
///
/// Column names, order and data types must match exactly; nullability may
/// only widen on the existing side.
///
/// # Errors
///
/// Returns [`StoreError::WriteConflict`] describing the first mismatch.
pub fn check_append_compatible(existing: &Schema, incoming: &Schema, table: &str) -> error::Result<()> {
    let conflict = |reason: String| StoreError::WriteConflict {
        table: table.to_string(),
        reason,
    };

    if existing.fields().len() != incoming.fields().len() {
        return Err(conflict(format!(
            "table has {} columns, result has {}",
            existing.fields().len(),
            incoming.fields().len()
        )));
    }

    for (position, (old, new)) in existing.fields().iter().zip(incoming.fields()).enumerate() {
        if old.name() != new.name() {
            return Err(conflict(format!(
                "column {position} is '{}' in the table but '{}' in the result",
                old.name(),
                new.name()
            )));
        }
        if old.data_type() != new.data_type() {
            return Err(conflict(format!(
                "column '{}' is {} in the table but {} in the result",
                old.name(),
                old.data_type(),
                new.data_type()
            )));
        }
        if !old.is_nullable() && new.is_nullable() {
            return Err(conflict(format!(
                "column '{}' is non-nullable in the table",
                old.name()
            )));
        }
    }
    Ok(())
}
