//! Raw delimited-file ingestion into a declared table schema.
//!
//! Landing a file runs four steps: keep and rename columns through an
//! optional column map, normalize strings (trim, empty to null), conform
//! every declared column to its type, and finally check nullability. All
//! input is first read as text, so type handling lives in one place.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use arrow::array::{
    new_null_array, Array, ArrayRef, BooleanArray, Decimal128Array, StringArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray,
};
use arrow::compute::{cast_with_options, CastOptions};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use lakeform_types::{ColumnSchema, ColumnType, TableSchema, TimestampUnit};
use serde::{Deserialize, Serialize};

const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
];
const AWARE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Upper bound on a daylight-saving gap, in minutes.
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// Errors produced while landing a raw file.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read delimited input: {0}")]
    Csv(#[from] csv::Error),

    #[error("unknown time zone '{0}'")]
    InvalidTimezone(String),

    #[error("column '{column}' cannot be converted to {data_type}: {message}")]
    Conversion {
        column: String,
        data_type: String,
        message: String,
    },

    #[error("column '{column}' is declared non-nullable but has {nulls} null value(s)")]
    NullViolation { column: String, nulls: usize },

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

/// A declared schema plus file-specific ingest settings, read from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestDefinition {
    #[serde(flatten)]
    pub schema: TableSchema,
    /// Original column name to target column name.
    #[serde(default)]
    pub column_map: BTreeMap<String, String>,
    /// Zone naive timestamps are assumed to be in.
    #[serde(default)]
    pub local_timezone: Option<String>,
}

impl IngestDefinition {
    /// Parse a definition from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse ingest schema YAML")
    }

    /// Read a definition file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the YAML is invalid.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read ingest schema file: {}", path.display()))?;
        Self::from_yaml_str(&content)
    }

    /// Options for this definition; `local_timezone` overrides the file's.
    pub fn options(&self, local_timezone: Option<String>) -> IngestOptions {
        IngestOptions {
            column_map: self.column_map.clone(),
            local_timezone: local_timezone.or_else(|| self.local_timezone.clone()),
            ..IngestOptions::default()
        }
    }
}

/// How to read and conform one file.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Original name to target name; when non-empty, unmapped columns are dropped.
    pub column_map: BTreeMap<String, String>,
    /// Zone naive timestamps are localized to; defaults to the column's zone.
    pub local_timezone: Option<String>,
    pub delimiter: u8,
    pub has_header: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            column_map: BTreeMap::new(),
            local_timezone: None,
            delimiter: b',',
            has_header: true,
        }
    }
}

/// Read a delimited file and conform it to `schema`.
///
/// # Errors
///
/// Any [`IngestError`] from reading, conversion or the nullability check.
pub fn ingest_delimited<R: Read>(
    reader: R,
    schema: &TableSchema,
    options: &IngestOptions,
) -> Result<RecordBatch, IngestError> {
    let raw = read_delimited(reader, options)?;
    let mapped = apply_column_map(raw, &options.column_map);
    let batch = conform_to_schema(&mapped, schema, options.local_timezone.as_deref())?;
    tracing::debug!(
        columns = batch.num_columns(),
        rows = batch.num_rows(),
        "Conformed delimited input"
    );
    Ok(batch)
}

/// Text columns read from a file, in file order.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub names: Vec<String>,
    /// One entry per column; values are trimmed and empty values are `None`.
    pub columns: Vec<Vec<Option<String>>>,
    pub rows: usize,
}

impl RawTable {
    fn column(&self, name: &str) -> Option<&[Option<String>]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }
}

/// Read every field as trimmed text.
///
/// Without a header row, columns are named `column_1`, `column_2`, ...
///
/// # Errors
///
/// [`IngestError::Csv`] for unreadable or ragged input.
pub fn read_delimited<R: Read>(reader: R, options: &IngestOptions) -> Result<RawTable, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(options.has_header)
        .delimiter(options.delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut names: Vec<String> = if options.has_header {
        reader.headers()?.iter().map(str::to_string).collect()
    } else {
        Vec::new()
    };
    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
    let mut rows = 0;

    for record in reader.records() {
        let record = record?;
        if names.is_empty() && rows == 0 {
            names = (1..=record.len()).map(|i| format!("column_{i}")).collect();
            columns = vec![Vec::new(); names.len()];
        }
        for (column, value) in columns.iter_mut().zip(record.iter()) {
            column.push((!value.is_empty()).then(|| value.to_string()));
        }
        rows += 1;
    }

    Ok(RawTable { names, columns, rows })
}

/// Keep only mapped columns, renamed; an empty map keeps everything.
pub fn apply_column_map(raw: RawTable, column_map: &BTreeMap<String, String>) -> RawTable {
    if column_map.is_empty() {
        return raw;
    }
    let mut names = Vec::new();
    let mut columns = Vec::new();
    for (name, column) in raw.names.into_iter().zip(raw.columns) {
        if let Some(target) = column_map.get(&name) {
            names.push(target.clone());
            columns.push(column);
        }
    }
    RawTable {
        names,
        columns,
        rows: raw.rows,
    }
}

/// Arrow type of a declared column.
///
/// # Errors
///
/// [`IngestError::InvalidTimezone`] for an unknown timestamp zone.
pub fn arrow_type(column_type: &ColumnType) -> Result<DataType, IngestError> {
    Ok(match column_type {
        ColumnType::Boolean => DataType::Boolean,
        ColumnType::Int8 => DataType::Int8,
        ColumnType::Int16 => DataType::Int16,
        ColumnType::Int32 => DataType::Int32,
        ColumnType::Int64 => DataType::Int64,
        ColumnType::UInt8 => DataType::UInt8,
        ColumnType::UInt16 => DataType::UInt16,
        ColumnType::UInt32 => DataType::UInt32,
        ColumnType::UInt64 => DataType::UInt64,
        ColumnType::Float32 => DataType::Float32,
        ColumnType::Float64 => DataType::Float64,
        ColumnType::Utf8 => DataType::Utf8,
        ColumnType::Date32 => DataType::Date32,
        ColumnType::Timestamp { unit, timezone } => {
            if let Some(tz) = timezone {
                parse_timezone(tz)?;
            }
            DataType::Timestamp(time_unit(*unit), timezone.as_deref().map(Into::into))
        }
        ColumnType::Decimal128 { precision, scale } => DataType::Decimal128(*precision, *scale),
    })
}

fn time_unit(unit: TimestampUnit) -> TimeUnit {
    match unit {
        TimestampUnit::Seconds => TimeUnit::Second,
        TimestampUnit::Millis => TimeUnit::Millisecond,
        TimestampUnit::Micros => TimeUnit::Microsecond,
        TimestampUnit::Nanos => TimeUnit::Nanosecond,
    }
}

fn parse_timezone(name: &str) -> Result<Tz, IngestError> {
    name.parse()
        .map_err(|_| IngestError::InvalidTimezone(name.to_string()))
}

/// Conform text columns to `schema`: declared order, declared types.
///
/// Declared columns absent from `raw` are all-null; undeclared columns are
/// dropped.
///
/// # Errors
///
/// `Conversion` for a value that cannot be converted strictly,
/// `NullViolation` for nulls in a non-nullable column, `InvalidTimezone`
/// for an unknown zone.
pub fn conform_to_schema(
    raw: &RawTable,
    schema: &TableSchema,
    local_timezone: Option<&str>,
) -> Result<RecordBatch, IngestError> {
    let local_tz = local_timezone.map(parse_timezone).transpose()?;
    let mut fields = Vec::with_capacity(schema.columns.len());
    let mut arrays = Vec::with_capacity(schema.columns.len());

    for column in &schema.columns {
        let data_type = arrow_type(&column.data_type)?;
        let array = match raw.column(&column.name) {
            Some(values) => conform_column(column, &data_type, values, local_tz)?,
            None => new_null_array(&data_type, raw.rows),
        };
        if !column.nullable && array.null_count() > 0 {
            return Err(IngestError::NullViolation {
                column: column.name.clone(),
                nulls: array.null_count(),
            });
        }
        fields.push(Field::new(column.name.as_str(), data_type, column.nullable));
        arrays.push(array);
    }

    Ok(RecordBatch::try_new_with_options(
        Arc::new(Schema::new(fields)),
        arrays,
        &RecordBatchOptions::new().with_row_count(Some(raw.rows)),
    )?)
}

fn conform_column(
    column: &ColumnSchema,
    data_type: &DataType,
    values: &[Option<String>],
    local_tz: Option<Tz>,
) -> Result<ArrayRef, IngestError> {
    let conversion = |message: String| IngestError::Conversion {
        column: column.name.clone(),
        data_type: column.data_type.to_string(),
        message,
    };

    match &column.data_type {
        ColumnType::Boolean => Ok(Arc::new(
            values
                .iter()
                .map(|v| v.as_deref().and_then(parse_textual_bool))
                .collect::<BooleanArray>(),
        )),
        ColumnType::Timestamp { unit, timezone } => {
            timestamp_column(values, *unit, timezone.as_deref(), local_tz)
        }
        ColumnType::Decimal128 { precision, scale } => {
            let parsed = values
                .iter()
                .map(|v| match v {
                    Some(text) => parse_decimal(text, *scale)
                        .map(Some)
                        .ok_or_else(|| conversion(format!("'{text}' is not a decimal number"))),
                    None => Ok(None),
                })
                .collect::<Result<Vec<Option<i128>>, IngestError>>()?;
            let array = Decimal128Array::from(parsed)
                .with_precision_and_scale(*precision, *scale)
                .map_err(|e| conversion(e.to_string()))?;
            array
                .validate_decimal_precision(*precision)
                .map_err(|e| conversion(e.to_string()))?;
            Ok(Arc::new(array))
        }
        _ => {
            let text: ArrayRef = Arc::new(values.iter().map(Option::as_deref).collect::<StringArray>());
            let options = CastOptions {
                safe: false,
                ..CastOptions::default()
            };
            cast_with_options(&text, data_type, &options).map_err(|e| conversion(e.to_string()))
        }
    }
}

/// `true/false/yes/no/1/0` in any case; anything else is null.
fn parse_textual_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn timestamp_column(
    values: &[Option<String>],
    unit: TimestampUnit,
    timezone: Option<&str>,
    local_tz: Option<Tz>,
) -> Result<ArrayRef, IngestError> {
    let target_tz = timezone.map(parse_timezone).transpose()?;
    let instants: Vec<Option<i64>> = values
        .iter()
        .map(|v| {
            let parsed = v.as_deref().and_then(parse_timestamp)?;
            let utc = match (parsed, target_tz) {
                (ParsedTimestamp::Aware(utc), _) => utc,
                (ParsedTimestamp::Naive(naive), None) => naive.and_utc(),
                (ParsedTimestamp::Naive(naive), Some(target)) => {
                    localize(naive, local_tz.unwrap_or(target))?.with_timezone(&Utc)
                }
            };
            to_unit(utc, unit)
        })
        .collect();

    let tz = timezone.map(str::to_string);
    Ok(match unit {
        TimestampUnit::Seconds => Arc::new(TimestampSecondArray::from(instants).with_timezone_opt(tz)),
        TimestampUnit::Millis => Arc::new(TimestampMillisecondArray::from(instants).with_timezone_opt(tz)),
        TimestampUnit::Micros => Arc::new(TimestampMicrosecondArray::from(instants).with_timezone_opt(tz)),
        TimestampUnit::Nanos => Arc::new(TimestampNanosecondArray::from(instants).with_timezone_opt(tz)),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParsedTimestamp {
    /// Carried an explicit offset.
    Aware(DateTime<Utc>),
    Naive(NaiveDateTime),
}

/// Parse text as a timestamp; unparsable text is `None`.
fn parse_timestamp(text: &str) -> Option<ParsedTimestamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(ParsedTimestamp::Aware(dt.with_timezone(&Utc)));
    }
    for format in AWARE_TIMESTAMP_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(ParsedTimestamp::Aware(dt.with_timezone(&Utc)));
        }
    }
    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ParsedTimestamp::Naive(naive));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(ParsedTimestamp::Naive)
}

/// Interpret a wall-clock time in `tz`.
///
/// Ambiguous times (clocks going back) are `None`. Nonexistent times (clocks
/// going forward) move to the first existing minute after the gap.
fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => Some(dt),
        chrono::LocalResult::Ambiguous(_, _) => None,
        chrono::LocalResult::None => {
            let mut probe = naive.with_second(0)?.with_nanosecond(0)?;
            for _ in 0..MAX_GAP_MINUTES {
                probe += Duration::minutes(1);
                if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
                    return Some(dt);
                }
            }
            None
        }
    }
}

fn to_unit(utc: DateTime<Utc>, unit: TimestampUnit) -> Option<i64> {
    match unit {
        TimestampUnit::Seconds => Some(utc.timestamp()),
        TimestampUnit::Millis => Some(utc.timestamp_millis()),
        TimestampUnit::Micros => Some(utc.timestamp_micros()),
        TimestampUnit::Nanos => utc.timestamp_nanos_opt(),
    }
}

/// Parse decimal text into an unscaled integer at `scale`, rounding half to
/// even. Accepts an optional sign, a fraction and an exponent.
fn parse_decimal(text: &str, scale: i8) -> Option<i128> {
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (number, exponent) = match body.find(['e', 'E']) {
        Some(i) => (&body[..i], body[i + 1..].parse::<i32>().ok()?),
        None => (body, 0),
    };
    let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut mantissa: i128 = 0;
    for digit in int_part.bytes().chain(frac_part.bytes()) {
        mantissa = mantissa.checked_mul(10)?.checked_add(i128::from(digit - b'0'))?;
    }

    let value_scale = i32::try_from(frac_part.len()).ok()?.checked_sub(exponent)?;
    let shift = i32::from(scale).checked_sub(value_scale)?;
    let unscaled = if shift >= 0 {
        mantissa.checked_mul(10_i128.checked_pow(u32::try_from(shift).ok()?)?)?
    } else {
        let drop = u32::try_from(shift.checked_neg()?).ok()?;
        match 10_i128.checked_pow(drop) {
            Some(divisor) => {
                let quotient = mantissa / divisor;
                let remainder = mantissa % divisor;
                let half = divisor / 2;
                if remainder > half || (remainder == half && quotient % 2 == 1) {
                    quotient + 1
                } else {
                    quotient
                }
            }
            // More dropped digits than an i128 holds: the value rounds to zero.
            None => 0,
        }
    };
    Some(if negative { -unscaled } else { unscaled })
}

#[cfg(test)]
mod tests {
    use arrow::array::{Float64Array, Int32Array};

    use super::*;

    fn schema(yaml: &str) -> TableSchema {
        IngestDefinition::from_yaml_str(yaml).unwrap().schema
    }

    fn ingest(csv: &str, schema: &TableSchema, options: &IngestOptions) -> RecordBatch {
        ingest_delimited(csv.as_bytes(), schema, options).unwrap()
    }

    #[test]
    fn test_reorders_and_adds_missing_columns() {
        let schema = schema(
            r#"
columns:
  - name: Id
    type: int32
    nullable: false
  - name: Name
    type: utf8
  - name: Missing
    type: float64
"#,
        );
        let batch = ingest("Name,Id\n  alice ,1\n,2\n", &schema, &IngestOptions::default());
        assert_eq!(batch.schema().field(0).name(), "Id");
        let ids = batch.column(0).as_any().downcast_ref::<Int32Array>().unwrap();
        assert_eq!(ids.values(), &[1, 2]);
        let names = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(names.value(0), "alice");
        assert!(names.is_null(1));
        let missing = batch.column(2).as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(missing.null_count(), 2);
    }

    #[test]
    fn test_column_map_keeps_and_renames() {
        let definition = IngestDefinition::from_yaml_str(
            r#"
columns:
  - name: CustomerName
    type: utf8
column_map:
  Customer Name: CustomerName
"#,
        )
        .unwrap();
        let options = definition.options(None);
        let raw = read_delimited("Customer Name,Ignored\nBob,x\n".as_bytes(), &options).unwrap();
        let mapped = apply_column_map(raw, &options.column_map);
        assert_eq!(mapped.names, vec!["CustomerName"]);
        let batch = conform_to_schema(&mapped, &definition.schema, None).unwrap();
        assert_eq!(batch.num_columns(), 1);
    }

    #[test]
    fn test_textual_booleans() {
        let schema = schema("columns:\n  - name: Flag\n    type: boolean\n");
        let batch = ingest("Flag\nYES\nno\n1\nFalse\nmaybe\n\n", &schema, &IngestOptions::default());
        let flags = batch.column(0).as_any().downcast_ref::<BooleanArray>().unwrap();
        let values: Vec<Option<bool>> = flags.iter().collect();
        assert_eq!(values, vec![Some(true), Some(false), Some(true), Some(false), None]);
    }

    #[test]
    fn test_strict_cast_rejects_garbage() {
        let schema = schema("columns:\n  - name: Qty\n    type: int64\n");
        let err = ingest_delimited("Qty\n12\nabc\n".as_bytes(), &schema, &IngestOptions::default())
            .unwrap_err();
        assert!(matches!(err, IngestError::Conversion { ref column, .. } if column == "Qty"), "got: {err}");
    }

    #[test]
    fn test_null_in_non_nullable_column() {
        let schema = schema("columns:\n  - name: Id\n    type: int64\n    nullable: false\n");
        let err = ingest_delimited("Id,Other\n1,a\n,b\n".as_bytes(), &schema, &IngestOptions::default())
            .unwrap_err();
        assert!(matches!(err, IngestError::NullViolation { nulls: 1, .. }), "got: {err}");
    }

    #[test]
    fn test_decimal_half_even_quantization() {
        assert_eq!(parse_decimal("1.005", 2), Some(100));
        assert_eq!(parse_decimal("1.015", 2), Some(102));
        assert_eq!(parse_decimal("1.0151", 2), Some(102));
        assert_eq!(parse_decimal("-2.5", 0), Some(-2));
        assert_eq!(parse_decimal("3.5", 0), Some(4));
        assert_eq!(parse_decimal("12", 2), Some(1200));
        assert_eq!(parse_decimal("1.5E2", 0), Some(150));
        assert_eq!(parse_decimal(".25", 1), Some(2));
        assert_eq!(parse_decimal("abc", 2), None);
        assert_eq!(parse_decimal("-", 2), None);
    }

    #[test]
    fn test_decimal_extreme_exponents_are_rejected() {
        assert_eq!(parse_decimal("1e-2147483648", 2), None);
        assert_eq!(parse_decimal("1e2147483647", 2), None);
        assert_eq!(parse_decimal("1.5e-2147483646", 2), Some(0));
    }

    #[test]
    fn test_extreme_exponent_fails_the_column() {
        let schema = schema(
            "columns:\n  - name: Amount\n    type: decimal128\n    precision: 10\n    scale: 2\n",
        );
        let err = ingest_delimited("Amount\n1e2147483647\n".as_bytes(), &schema, &IngestOptions::default())
            .unwrap_err();
        assert!(matches!(err, IngestError::Conversion { ref column, .. } if column == "Amount"), "got: {err}");
    }

    #[test]
    fn test_decimal_column_precision_checked() {
        let schema = schema(
            "columns:\n  - name: Amount\n    type: decimal128\n    precision: 5\n    scale: 2\n",
        );
        let batch = ingest("Amount\n123.456\n\n", &schema, &IngestOptions::default());
        let amounts = batch.column(0).as_any().downcast_ref::<Decimal128Array>().unwrap();
        assert_eq!(amounts.value(0), 12346);

        let err = ingest_delimited("Amount\n123456.7\n".as_bytes(), &schema, &IngestOptions::default())
            .unwrap_err();
        assert!(matches!(err, IngestError::Conversion { .. }), "got: {err}");
    }

    fn copenhagen_seconds(csv: &str) -> Vec<Option<i64>> {
        let schema = schema(
            r#"
columns:
  - name: LoadedAt
    type: timestamp
    unit: seconds
    timezone: Europe/Copenhagen
"#,
        );
        let batch = ingest(csv, &schema, &IngestOptions::default());
        let column = batch.column(0).as_any().downcast_ref::<TimestampSecondArray>().unwrap();
        assert_eq!(
            batch.schema().field(0).data_type(),
            &DataType::Timestamp(TimeUnit::Second, Some("Europe/Copenhagen".into()))
        );
        column.iter().collect()
    }

    fn utc_seconds(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Option<i64> {
        Some(Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap().timestamp())
    }

    #[test]
    fn test_naive_timestamps_localized_to_column_zone() {
        let values = copenhagen_seconds("LoadedAt\n2024-07-01 14:00:00\n2024-01-15 10:30:00\nnot a time\n");
        assert_eq!(
            values,
            vec![utc_seconds(2024, 7, 1, 12, 0), utc_seconds(2024, 1, 15, 9, 30), None]
        );
    }

    #[test]
    fn test_nonexistent_local_time_shifts_forward() {
        // 02:30 on 2024-03-31 does not exist in Copenhagen; 03:00 CEST is 01:00 UTC.
        let values = copenhagen_seconds("LoadedAt\n2024-03-31 02:30:00\n");
        assert_eq!(values, vec![utc_seconds(2024, 3, 31, 1, 0)]);
    }

    #[test]
    fn test_ambiguous_local_time_is_null() {
        let values = copenhagen_seconds("LoadedAt\n2024-10-27 02:30:00\n");
        assert_eq!(values, vec![None]);
    }

    #[test]
    fn test_aware_timestamps_converted() {
        let values = copenhagen_seconds("LoadedAt\n2024-07-01T12:00:00+00:00\n");
        assert_eq!(values, vec![utc_seconds(2024, 7, 1, 12, 0)]);
    }

    #[test]
    fn test_local_timezone_override() {
        let schema = schema(
            "columns:\n  - name: At\n    type: timestamp\n    unit: seconds\n    timezone: UTC\n",
        );
        let options = IngestOptions {
            local_timezone: Some("Europe/Copenhagen".into()),
            ..IngestOptions::default()
        };
        let batch = ingest("At\n2024-07-01 14:00:00\n", &schema, &options);
        let column = batch.column(0).as_any().downcast_ref::<TimestampSecondArray>().unwrap();
        assert_eq!(Some(column.value(0)), utc_seconds(2024, 7, 1, 12, 0));
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let schema = schema(
            "columns:\n  - name: At\n    type: timestamp\n    timezone: Atlantis/Lost\n",
        );
        let err = ingest_delimited("At\n2024-01-01\n".as_bytes(), &schema, &IngestOptions::default())
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidTimezone(ref tz) if tz == "Atlantis/Lost"));
    }

    #[test]
    fn test_headerless_input_gets_positional_names() {
        let options = IngestOptions {
            has_header: false,
            delimiter: b';',
            ..IngestOptions::default()
        };
        let raw = read_delimited("1;a\n2;b\n".as_bytes(), &options).unwrap();
        assert_eq!(raw.names, vec!["column_1", "column_2"]);
        assert_eq!(raw.rows, 2);
    }
}
