use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};

use lakeform_engine::{ingest_delimited, IngestDefinition};
use lakeform_store::{IpcLakehouse, LakehouseSink};
use lakeform_types::WriteMode;

pub struct IngestArgs {
    pub file: PathBuf,
    pub schema: PathBuf,
    pub table: String,
    pub target: PathBuf,
    pub local_timezone: Option<String>,
    pub mode: WriteMode,
    pub delimiter: char,
}

/// Execute the `ingest` command: conform a delimited file to its schema and
/// write it to the target lakehouse.
pub fn execute(args: &IngestArgs) -> Result<()> {
    let definition = IngestDefinition::load(&args.schema)?;
    let mut options = definition.options(args.local_timezone.clone());
    options.delimiter = u8::try_from(args.delimiter)
        .with_context(|| format!("Delimiter '{}' is not a single-byte character", args.delimiter))?;

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open input file: {}", args.file.display()))?;
    let batch = ingest_delimited(file, &definition.schema, &options)
        .with_context(|| format!("Failed to ingest {}", args.file.display()))?;

    let target = IpcLakehouse::open(&args.target)
        .with_context(|| format!("Failed to open target lakehouse: {}", args.target.display()))?;
    let summary = target
        .write_table(&batch, &args.table, args.mode)
        .with_context(|| format!("Failed to write table '{}'", args.table))?;

    tracing::info!(
        table = summary.table,
        mode = %summary.mode,
        rows = summary.rows_written,
        "Ingested delimited file"
    );
    println!(
        "Ingested {} row(s) into '{}' ({}); table now has {} row(s).",
        summary.rows_written, summary.table, summary.mode, summary.total_rows
    );
    Ok(())
}
