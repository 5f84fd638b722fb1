//! Persisting a transformation result to its target table.

use std::collections::BTreeSet;

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use lakeform_store::backend::check_append_compatible;
use lakeform_store::{LakehouseSink, WriteSummary};
use lakeform_types::{LineageColumn, TransformError, WriteMode};

use crate::projection::ProjectionSpec;

/// The materialized output relation and its target table.
///
/// Consumed by [`write_result`]; a result is written at most once.
#[derive(Debug)]
pub struct TransformationResult {
    batch: RecordBatch,
    target_table: String,
    lineage: &'static [LineageColumn],
}

impl TransformationResult {
    pub fn new(batch: RecordBatch, target_table: impl Into<String>, spec: &ProjectionSpec) -> Self {
        Self {
            batch,
            target_table: target_table.into(),
            lineage: spec.lineage(),
        }
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn target_table(&self) -> &str {
        &self.target_table
    }

    pub fn lineage(&self) -> &'static [LineageColumn] {
        self.lineage
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }
}

/// Check an existing target table against a result about to be written.
///
/// Both modes require the same lineage columns, first and in order.
/// `Append` additionally requires the complete column list (names, order
/// and types) to match; `Overwrite` lets business columns change.
///
/// # Errors
///
/// `WriteConflict` describing the first mismatch.
pub fn check_target_compatibility(
    existing: &Schema,
    result: &TransformationResult,
    mode: WriteMode,
) -> Result<(), TransformError> {
    let conflict = |reason: String| TransformError::WriteConflict {
        table: result.target_table.clone(),
        reason,
    };

    let existing_lineage: BTreeSet<LineageColumn> = existing
        .fields()
        .iter()
        .filter_map(|f| LineageColumn::from_name(f.name()))
        .collect();
    let produced: BTreeSet<LineageColumn> = result.lineage.iter().copied().collect();

    if let Some(missing) = produced.difference(&existing_lineage).next() {
        return Err(conflict(format!("target has no lineage column '{missing}'")));
    }
    if let Some(extra) = existing_lineage.difference(&produced).next() {
        return Err(conflict(format!(
            "target has lineage column '{extra}' which the result does not produce"
        )));
    }
    for (position, expected) in result.lineage.iter().enumerate() {
        let found = existing.fields().get(position).map(|f| f.name().as_str());
        if found != Some(expected.name()) {
            return Err(conflict(format!(
                "target column {position} is '{}', expected lineage column '{expected}'",
                found.unwrap_or("<none>")
            )));
        }
    }

    if mode == WriteMode::Append {
        check_append_compatible(existing, &result.batch.schema(), &result.target_table)?;
    }
    Ok(())
}

/// Write `result` to its target table.
///
/// The store either lands the whole batch or nothing.
///
/// # Errors
///
/// `WriteConflict` when the existing target is incompatible, or a `Store`
/// error from the sink.
pub fn write_result(
    sink: &dyn LakehouseSink,
    result: TransformationResult,
    mode: WriteMode,
) -> Result<WriteSummary, TransformError> {
    if let Some(existing) = sink.target_schema(&result.target_table)? {
        check_target_compatibility(&existing, &result, mode)?;
    }

    let summary = sink.write_table(&result.batch, &result.target_table, mode)?;
    tracing::info!(
        table = %summary.table,
        mode = %summary.mode,
        rows = summary.rows_written,
        total_rows = summary.total_rows,
        "Wrote transformation result"
    );
    Ok(summary)
}
