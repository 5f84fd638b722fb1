//! Transformation run result types and timing breakdowns.

use arrow::record_batch::RecordBatch;
use lakeform_types::WriteMode;

/// Wall-clock time spent in each stage.
#[derive(Debug, Clone, Default)]
pub struct StageTiming {
    pub bind_secs: f64,
    pub join_secs: f64,
    pub project_secs: f64,
    pub enrich_secs: f64,
    pub write_secs: f64,
}

/// Result of a completed transformation run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub transformation: String,
    pub target_table: String,
    pub write_mode: WriteMode,
    pub rows_written: u64,
    /// Rows in the target after the write.
    pub total_rows: u64,
    pub output_columns: Vec<String>,
    pub source_system: String,
    pub load_timestamp_utc: String,
    pub load_timestamp_local: String,
    pub timing: StageTiming,
    pub duration_secs: f64,
}

/// Result of a dry run: every stage but the write.
#[derive(Debug, Clone)]
pub struct DryRunResult {
    pub transformation: String,
    pub target_table: String,
    pub output_columns: Vec<String>,
    /// The enriched output that would have been written.
    pub output: RecordBatch,
    pub timing: StageTiming,
    pub duration_secs: f64,
}

/// Outcome of [`run_transformation`](crate::orchestrator::run_transformation).
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Run(RunResult),
    DryRun(DryRunResult),
}

/// One output column of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedColumn {
    pub name: String,
    /// `alias.column` for business columns, `lineage` for lineage columns.
    pub source: String,
    pub aliased: bool,
}

/// Bind, join and projection outcome without enrichment or write.
#[derive(Debug, Clone)]
pub struct PlanResult {
    pub transformation: String,
    pub target_table: String,
    pub aliases: Vec<String>,
    pub joined_rows: u64,
    pub columns: Vec<PlannedColumn>,
}
