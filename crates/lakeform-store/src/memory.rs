//! In-memory lakehouse.
//!
//! Tables live in a `RwLock<BTreeMap<..>>`. A write builds the complete new
//! table first and swaps it in under the write lock, so the map is never
//! left half-updated and a poisoned lock is recovered rather than reported.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use lakeform_types::WriteMode;

use crate::backend::{check_append_compatible, project_columns, LakehouseSink, LakehouseSource, WriteSummary};
use crate::error::{self, StoreError};

/// Lakehouse held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryLakehouse {
    tables: RwLock<BTreeMap<String, RecordBatch>>,
}

impl MemoryLakehouse {
    /// Create an empty lakehouse.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`MemoryLakehouse::insert_table`].
    #[must_use]
    pub fn with_table(self, name: impl Into<String>, batch: RecordBatch) -> Self {
        self.insert_table(name, batch);
        self
    }

    /// Insert or replace a table.
    pub fn insert_table(&self, name: impl Into<String>, batch: RecordBatch) {
        self.write_lock().insert(name.into(), batch);
    }

    /// Snapshot of a table, if present.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<RecordBatch> {
        self.read_lock().get(name).cloned()
    }

    /// Names of all tables, sorted.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        self.read_lock().keys().cloned().collect()
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, BTreeMap<String, RecordBatch>> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, BTreeMap<String, RecordBatch>> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LakehouseSource for MemoryLakehouse {
    fn table_schema(&self, table: &str) -> error::Result<SchemaRef> {
        self.read_lock()
            .get(table)
            .map(RecordBatch::schema)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }

    fn read_table(&self, table: &str, columns: &[String]) -> error::Result<RecordBatch> {
        let tables = self.read_lock();
        let batch = tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        project_columns(batch, table, columns)
    }
}

impl LakehouseSink for MemoryLakehouse {
    fn target_schema(&self, table: &str) -> error::Result<Option<SchemaRef>> {
        Ok(self.read_lock().get(table).map(RecordBatch::schema))
    }

    fn write_table(
        &self,
        batch: &RecordBatch,
        table: &str,
        mode: WriteMode,
    ) -> error::Result<WriteSummary> {
        let mut tables = self.write_lock();
        let next = match (mode, tables.get(table)) {
            (WriteMode::Append, Some(existing)) => append_batch(existing, batch, table)?,
            _ => batch.clone(),
        };
        let total_rows = next.num_rows() as u64;
        tables.insert(table.to_string(), next);
        tracing::debug!(table, %mode, rows = batch.num_rows(), "memory lakehouse write");
        Ok(WriteSummary {
            table: table.to_string(),
            mode,
            rows_written: batch.num_rows() as u64,
            total_rows,
        })
    }
}

/// Concatenate `incoming` after `existing`, keeping the existing schema.
pub(crate) fn append_batch(
    existing: &RecordBatch,
    incoming: &RecordBatch,
    table: &str,
) -> error::Result<RecordBatch> {
    let schema = existing.schema();
    check_append_compatible(&schema, &incoming.schema(), table)?;
    let aligned = RecordBatch::try_new(schema.clone(), incoming.columns().to_vec())?;
    Ok(concat_batches(&schema, [existing, &aligned])?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};

    use super::*;

    fn batch(ids: Vec<i64>, names: Vec<&str>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(ids)),
                Arc::new(StringArray::from(names)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn read_unknown_table_fails() {
        let lake = MemoryLakehouse::new();
        let err = lake.read_table("missing", &["id".into()]).unwrap_err();
        assert!(matches!(err, StoreError::UnknownTable(ref t) if t == "missing"));
    }

    #[test]
    fn read_projects_columns() {
        let lake = MemoryLakehouse::new().with_table("people", batch(vec![1, 2], vec!["a", "b"]));
        let read = lake.read_table("people", &["name".into()]).unwrap();
        assert_eq!(read.num_columns(), 1);
        assert_eq!(read.schema().field(0).name(), "name");
    }

    #[test]
    fn overwrite_replaces_rows() {
        let lake = MemoryLakehouse::new().with_table("people", batch(vec![1, 2], vec!["a", "b"]));
        let summary = lake
            .write_table(&batch(vec![3], vec!["c"]), "people", WriteMode::Overwrite)
            .unwrap();
        assert_eq!(summary.rows_written, 1);
        assert_eq!(summary.total_rows, 1);
        assert_eq!(lake.table("people").unwrap().num_rows(), 1);
    }

    #[test]
    fn append_concatenates_rows() {
        let lake = MemoryLakehouse::new().with_table("people", batch(vec![1, 2], vec!["a", "b"]));
        let summary = lake
            .write_table(&batch(vec![3], vec!["c"]), "people", WriteMode::Append)
            .unwrap();
        assert_eq!(summary.total_rows, 3);
        let table = lake.table("people").unwrap();
        let ids = table
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(ids.values(), &[1, 2, 3]);
    }

    #[test]
    fn append_to_missing_table_creates_it() {
        let lake = MemoryLakehouse::new();
        lake.write_table(&batch(vec![1], vec!["a"]), "people", WriteMode::Append)
            .unwrap();
        assert_eq!(lake.table_names(), vec!["people".to_string()]);
    }

    #[test]
    fn append_with_mismatched_schema_leaves_table_untouched() {
        let lake = MemoryLakehouse::new().with_table("people", batch(vec![1, 2], vec!["a", "b"]));
        let other_schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
        let other =
            RecordBatch::try_new(other_schema, vec![Arc::new(Int64Array::from(vec![9]))]).unwrap();
        let err = lake
            .write_table(&other, "people", WriteMode::Append)
            .unwrap_err();
        assert!(matches!(err, StoreError::WriteConflict { .. }));
        let table = lake.table("people").unwrap();
        assert_eq!(table.num_rows(), 2);
        assert!(table.column(1).is_valid(0));
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let lake = Arc::new(MemoryLakehouse::new().with_table("people", batch(vec![1], vec!["a"])));
        let poisoner = Arc::clone(&lake);
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.tables.write().unwrap();
            panic!("poison the table lock");
        })
        .join();
        assert!(joined.is_err());
        assert!(lake.tables.is_poisoned());

        let lake = Arc::try_unwrap(lake).unwrap().with_table("more", batch(vec![2], vec!["b"]));
        assert_eq!(lake.table_names(), vec!["more".to_string(), "people".to_string()]);
        let summary = lake
            .write_table(&batch(vec![3], vec!["c"]), "people", WriteMode::Append)
            .unwrap();
        assert_eq!(summary.total_rows, 2);
    }
}
