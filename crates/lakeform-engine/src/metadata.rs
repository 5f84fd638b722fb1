//! Lineage metadata: source tag, load timestamps and surrogate keys.
//!
//! The load timestamp is captured once per run, so both timestamp columns
//! hold the same value on every row. Surrogate keys come from a
//! [`KeyRangeAllocator`]; the default [`RunScopedKeys`] restarts at the base
//! offset on every run.

use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use lakeform_types::lineage::TIMESTAMP_FORMAT;
use lakeform_types::{LineageColumn, TransformError};

use crate::config::types::MetadataConfig;
use crate::projection::ProjectionSpec;

/// The instant a run loads its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTimestamp {
    utc: DateTime<Utc>,
}

impl LoadTimestamp {
    pub fn now() -> Self {
        Self { utc: Utc::now() }
    }

    pub fn at(utc: DateTime<Utc>) -> Self {
        Self { utc }
    }

    pub fn utc(&self) -> DateTime<Utc> {
        self.utc
    }

    /// UTC value, formatted `yyyy-MM-dd HH:mm:ss`.
    pub fn format_utc(&self) -> String {
        self.utc.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Same instant in `tz`, formatted `yyyy-MM-dd HH:mm:ss`.
    pub fn format_local(&self, tz: Tz) -> String {
        self.utc.with_timezone(&tz).format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Hands out contiguous surrogate key ranges.
pub trait KeyRangeAllocator {
    /// Reserve `count` consecutive keys and return the first one.
    ///
    /// # Errors
    ///
    /// `KeyAllocation` when the range cannot be reserved.
    fn allocate(&mut self, count: u64) -> Result<i64, TransformError>;
}

/// Keys scoped to a single run, starting at the base offset.
#[derive(Debug, Clone)]
pub struct RunScopedKeys {
    next: i64,
}

impl RunScopedKeys {
    pub fn new(base_offset: i64) -> Self {
        Self { next: base_offset }
    }
}

impl KeyRangeAllocator for RunScopedKeys {
    fn allocate(&mut self, count: u64) -> Result<i64, TransformError> {
        let start = self.next;
        self.next = i64::try_from(count)
            .ok()
            .and_then(|count| start.checked_add(count))
            .ok_or_else(|| TransformError::KeyAllocation {
                message: format!("{count} keys from {start} overflow i64"),
            })?;
        Ok(start)
    }
}

/// Computes and prepends lineage columns for one run.
#[derive(Debug, Clone)]
pub struct MetadataEnricher {
    source_system: String,
    timezone: Tz,
    base_offset: i64,
    timestamp: LoadTimestamp,
}

impl MetadataEnricher {
    /// # Errors
    ///
    /// `MissingSourceTag` for an absent or blank tag, `InvalidTimezone` for
    /// an unknown zone name.
    pub fn new(config: &MetadataConfig, timestamp: LoadTimestamp) -> Result<Self, TransformError> {
        let source_system = config
            .source_system_tag
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .ok_or(TransformError::MissingSourceTag)?
            .to_string();
        let timezone: Tz = config
            .local_timezone
            .parse()
            .map_err(|_| TransformError::InvalidTimezone {
                timezone: config.local_timezone.clone(),
            })?;
        Ok(Self {
            source_system,
            timezone,
            base_offset: config.surrogate_key_base_offset,
            timestamp,
        })
    }

    pub fn source_system(&self) -> &str {
        &self.source_system
    }

    pub fn timestamp(&self) -> LoadTimestamp {
        self.timestamp
    }

    pub fn timestamp_utc(&self) -> String {
        self.timestamp.format_utc()
    }

    pub fn timestamp_local(&self) -> String {
        self.timestamp.format_local(self.timezone)
    }

    /// Prepend the lineage prefix of `spec` to `business`.
    ///
    /// Surrogate keys are drawn from `keys` in row order, so they increase
    /// strictly with emission order.
    ///
    /// # Errors
    ///
    /// `KeyAllocation` if the allocator fails or hands out a range below the
    /// base offset; `Evaluation` if the batch cannot be assembled.
    pub fn enrich(
        &self,
        spec: &ProjectionSpec,
        business: &RecordBatch,
        keys: &mut dyn KeyRangeAllocator,
    ) -> Result<RecordBatch, TransformError> {
        let rows = business.num_rows();
        let width = spec.lineage().len() + business.num_columns();
        let mut fields: Vec<Field> = Vec::with_capacity(width);
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(width);

        for lineage in spec.lineage() {
            let (data_type, column) = match lineage {
                LineageColumn::SourceSystem => (DataType::Utf8, constant(&self.source_system, rows)),
                LineageColumn::DataLoadTimestampUtc => (DataType::Utf8, constant(&self.timestamp_utc(), rows)),
                LineageColumn::DataLoadTimestampLocal => {
                    (DataType::Utf8, constant(&self.timestamp_local(), rows))
                }
                LineageColumn::SurrogateKey => (DataType::Int64, self.surrogate_keys(rows, keys)?),
            };
            fields.push(Field::new(lineage.name(), data_type, false));
            columns.push(column);
        }

        let schema = business.schema();
        fields.extend(schema.fields().iter().map(|f| f.as_ref().clone()));
        columns.extend(business.columns().iter().cloned());

        RecordBatch::try_new_with_options(
            Arc::new(Schema::new(fields)),
            columns,
            &RecordBatchOptions::new().with_row_count(Some(rows)),
        )
        .map_err(TransformError::evaluation)
    }

    fn surrogate_keys(
        &self,
        rows: usize,
        keys: &mut dyn KeyRangeAllocator,
    ) -> Result<ArrayRef, TransformError> {
        let start = keys.allocate(rows as u64)?;
        if start < self.base_offset {
            return Err(TransformError::KeyAllocation {
                message: format!(
                    "allocated key {start} is below the base offset {}",
                    self.base_offset
                ),
            });
        }
        let end = i64::try_from(rows)
            .ok()
            .and_then(|n| start.checked_add(n))
            .ok_or_else(|| TransformError::KeyAllocation {
                message: format!("{rows} keys from {start} overflow i64"),
            })?;
        Ok(Arc::new(Int64Array::from_iter_values(start..end)))
    }
}

fn constant(value: &str, rows: usize) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(std::iter::repeat(value).take(rows)))
}
