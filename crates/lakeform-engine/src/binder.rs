//! Source binding: read requested columns of a named table under an alias.

use std::collections::HashSet;

use arrow::record_batch::RecordBatch;
use lakeform_store::LakehouseSource;
use lakeform_types::TransformError;

/// A source table bound into a plan.
#[derive(Debug, Clone)]
pub struct DatasetHandle {
    /// Table name in the source lakehouse.
    pub table_name: String,
    /// Unique name of this dataset within one plan.
    pub alias: String,
    /// Requested columns, in requested order.
    pub columns: Vec<String>,
    /// Rows read from the source, restricted to `columns`.
    pub batch: RecordBatch,
}

impl DatasetHandle {
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }
}

/// Bind `columns` of `table` under `alias`.
///
/// An empty `alias` binds the dataset under its table name. The only side
/// effect is a read from `source`.
///
/// # Errors
///
/// `EmptyColumnList` or `DuplicateColumn` for a malformed request;
/// `UnknownTable` or `UnknownColumn` when the source cannot satisfy it.
pub fn bind_source(
    source: &dyn LakehouseSource,
    table: &str,
    alias: &str,
    columns: &[String],
) -> Result<DatasetHandle, TransformError> {
    if columns.is_empty() {
        return Err(TransformError::EmptyColumnList {
            table: table.to_string(),
        });
    }
    let mut seen = HashSet::with_capacity(columns.len());
    if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
        return Err(TransformError::DuplicateColumn {
            table: table.to_string(),
            column: dup.clone(),
        });
    }

    let batch = source.read_table(table, columns)?;
    let alias = if alias.trim().is_empty() { table } else { alias };

    tracing::debug!(
        table,
        alias,
        columns = columns.len(),
        rows = batch.num_rows(),
        "Bound source dataset"
    );

    Ok(DatasetHandle {
        table_name: table.to_string(),
        alias: alias.to_string(),
        columns: columns.to_vec(),
        batch,
    })
}
