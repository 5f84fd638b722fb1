//! Transformation engine for lakeform.
//!
//! Binds source tables, joins them, projects business columns, enriches the
//! output with lineage metadata and writes it to a target table.

pub mod binder;
pub mod config;
pub mod errors;
pub mod ingest;
pub mod join;
pub mod mappings;
pub mod metadata;
pub mod naming;
pub mod orchestrator;
pub mod projection;
pub mod result;
pub mod sink;

#[cfg(test)]
pub(crate) mod testing;

// Re-export public API for convenience
pub use errors::PipelineError;
pub use ingest::{ingest_delimited, IngestDefinition, IngestError, IngestOptions};
pub use mappings::{LakehouseMappings, LakehousePaths};
pub use metadata::{KeyRangeAllocator, LoadTimestamp, RunScopedKeys};
pub use orchestrator::{
    check_transformation, plan_transformation, prepare_transformation, run_transformation,
    run_transformation_with, ExecutionOptions, PreparedTransformation,
};
pub use result::{DryRunResult, PlanResult, RunOutcome, RunResult, StageTiming};
