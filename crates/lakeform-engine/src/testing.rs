//! Shared fixtures for unit tests.

use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use lakeform_store::MemoryLakehouse;

/// Build a batch from `(name, column)` pairs; every field is nullable.
pub(crate) fn batch(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
        .collect();
    let arrays = columns.into_iter().map(|(_, array)| array).collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
}

pub(crate) fn ints(values: Vec<Option<i64>>) -> ArrayRef {
    Arc::new(Int64Array::from(values))
}

pub(crate) fn strs(values: Vec<Option<&str>>) -> ArrayRef {
    Arc::new(StringArray::from(values))
}

/// `tableone[col1, col2, col3]` and `tabletwo[col1, col2, col4]`.
///
/// Key `(3, "c")` has no match in `tabletwo`; `(4, "d")` exists only there.
pub(crate) fn scenario_lakehouse() -> MemoryLakehouse {
    let tableone = batch(vec![
        ("col1", ints(vec![Some(1), Some(2), Some(3)])),
        ("col2", strs(vec![Some("a"), Some("b"), Some("c")])),
        ("col3", strs(vec![Some("x1"), Some("x2"), Some("x3")])),
    ]);
    let tabletwo = batch(vec![
        ("col1", ints(vec![Some(2), Some(1), Some(4)])),
        ("col2", strs(vec![Some("b"), Some("a"), Some("d")])),
        ("col4", strs(vec![Some("y2"), Some("y1"), Some("y4")])),
    ]);
    MemoryLakehouse::new()
        .with_table("tableone", tableone)
        .with_table("tabletwo", tabletwo)
}

pub(crate) fn string_values(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    let column = batch.column_by_name(name).unwrap();
    let strings = column.as_any().downcast_ref::<StringArray>().unwrap();
    strings.iter().map(|v| v.map(str::to_string)).collect()
}

pub(crate) fn int_values(batch: &RecordBatch, name: &str) -> Vec<Option<i64>> {
    let column = batch.column_by_name(name).unwrap();
    let ints = column.as_any().downcast_ref::<Int64Array>().unwrap();
    ints.iter().collect()
}

pub(crate) fn field_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}
