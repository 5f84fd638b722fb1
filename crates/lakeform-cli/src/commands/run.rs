use std::path::Path;

use anyhow::{Context, Result};
use arrow::util::pretty::pretty_format_batches;

use lakeform_engine::config::parser;
use lakeform_engine::{orchestrator, ExecutionOptions, RunOutcome, StageTiming};
use lakeform_store::{IpcLakehouse, LakehouseSink, MemoryLakehouse};

/// Execute the `run` command: parse, validate, and run a transformation.
pub fn execute(definition: &Path, source_dir: &Path, target_dir: &Path, dry_run: bool) -> Result<()> {
    let config = parser::parse_transformation(definition)
        .with_context(|| format!("Failed to parse transformation: {}", definition.display()))?;

    let source = IpcLakehouse::open(source_dir)
        .with_context(|| format!("Failed to open source lakehouse: {}", source_dir.display()))?;
    let target = open_target(target_dir, dry_run)?;

    let outcome =
        orchestrator::run_transformation(&config, &source, target.as_ref(), &ExecutionOptions { dry_run })?;

    match outcome {
        RunOutcome::Run(result) => {
            println!("Transformation '{}' completed successfully.", result.transformation);
            println!("  Target table:    {} ({})", result.target_table, result.write_mode);
            println!("  Rows written:    {}", result.rows_written);
            println!("  Rows in target:  {}", result.total_rows);
            println!("  Source system:   {}", result.source_system);
            println!("  Loaded at (UTC): {}", result.load_timestamp_utc);
            println!("  Loaded at local: {}", result.load_timestamp_local);
            println!("  Columns:         {}", result.output_columns.join(", "));
            print_timing(&result.timing);
            println!("  Duration:        {:.2}s", result.duration_secs);
        }
        RunOutcome::DryRun(result) => {
            println!(
                "Dry run of '{}': {} row(s) would be written to '{}'.",
                result.transformation,
                result.output.num_rows(),
                result.target_table
            );
            print_timing(&result.timing);
            let table = pretty_format_batches(std::slice::from_ref(&result.output))
                .context("Failed to format dry-run output")?;
            println!("{table}");
        }
    }

    Ok(())
}

/// A dry run never writes, so it gets a throwaway sink and the target
/// directory is left alone.
fn open_target(target_dir: &Path, dry_run: bool) -> Result<Box<dyn LakehouseSink>> {
    if dry_run {
        return Ok(Box::new(MemoryLakehouse::new()));
    }
    let target = IpcLakehouse::open(target_dir)
        .with_context(|| format!("Failed to open target lakehouse: {}", target_dir.display()))?;
    Ok(Box::new(target))
}

fn print_timing(timing: &StageTiming) {
    println!("  Bind:            {:.3}s", timing.bind_secs);
    println!("  Join:            {:.3}s", timing.join_secs);
    println!("  Project:         {:.3}s", timing.project_secs);
    println!("  Enrich:          {:.3}s", timing.enrich_secs);
    if timing.write_secs > 0.0 {
        println!("  Write:           {:.3}s", timing.write_secs);
    }
}
