//! Transformation orchestrator: runs the five stages in order.
//!
//! Bind, join, project, enrich, write. A stage consumes only what earlier
//! stages produced. The first failing stage ends the run and nothing after it
//! executes, so a failed run never reaches the sink.

use std::collections::HashMap;
use std::time::Instant;

use lakeform_store::{LakehouseSink, LakehouseSource};
use lakeform_types::{Stage, TransformError};

use crate::binder::{bind_source, DatasetHandle};
use crate::config::types::{JoinConfig, TransformationConfig};
use crate::config::validator::validate_transformation;
use crate::errors::PipelineError;
use crate::join::{plan_joins, JoinCondition, JoinStep, JoinedRelation};
use crate::metadata::{KeyRangeAllocator, LoadTimestamp, MetadataEnricher, RunScopedKeys};
use crate::projection::{build_projection, select_business, ColumnMapping, ProjectionSource, ProjectionSpec};
use crate::result::{DryRunResult, PlanResult, PlannedColumn, RunOutcome, RunResult, StageTiming};
use crate::sink::{write_result, TransformationResult};

/// Options for a single run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Run every stage except the write.
    pub dry_run: bool,
}

/// Output of the first four stages, ready for the sink.
#[derive(Debug)]
pub struct PreparedTransformation {
    pub spec: ProjectionSpec,
    pub result: TransformationResult,
    pub source_system: String,
    pub load_timestamp_utc: String,
    pub load_timestamp_local: String,
    pub timing: StageTiming,
}

fn run_stage<T>(
    transformation: &str,
    stage: Stage,
    secs: &mut f64,
    f: impl FnOnce() -> Result<T, TransformError>,
) -> Result<T, PipelineError> {
    let start = Instant::now();
    let outcome = f();
    *secs = start.elapsed().as_secs_f64();
    match outcome {
        Ok(value) => {
            tracing::debug!(transformation, stage = %stage, duration_secs = *secs, "Stage completed");
            Ok(value)
        }
        Err(error) => {
            tracing::error!(
                transformation,
                stage = %stage,
                class = %error.class(),
                error = %error,
                "Stage failed"
            );
            Err(PipelineError::Stage { stage, error })
        }
    }
}

fn join_conditions(join: &JoinConfig) -> Vec<JoinCondition> {
    join.using
        .iter()
        .cloned()
        .map(JoinCondition::Using)
        .chain(join.on.iter().map(|p| JoinCondition::On {
            left: p.left.clone(),
            right: p.right.clone(),
        }))
        .collect()
}

fn column_mappings(config: &TransformationConfig) -> Vec<ColumnMapping> {
    config
        .projection
        .iter()
        .map(|p| ColumnMapping {
            column: p.column.clone(),
            name: p.name.clone(),
        })
        .collect()
}

/// Bind every declared source, in declaration order.
fn bind_sources(
    config: &TransformationConfig,
    source: &dyn LakehouseSource,
) -> Result<Vec<DatasetHandle>, TransformError> {
    config
        .sources
        .iter()
        .map(|s| bind_source(source, &s.table, s.alias(), &s.columns))
        .collect()
}

/// Split bound datasets into the base and one step per configured join.
fn join_steps(
    config: &TransformationConfig,
    datasets: Vec<DatasetHandle>,
) -> Result<(DatasetHandle, Vec<JoinStep>), TransformError> {
    let mut datasets = datasets.into_iter();
    let base = datasets.next().ok_or_else(|| TransformError::InvalidJoinPredicate {
        message: "transformation declares no sources".to_string(),
    })?;

    let mut by_alias: HashMap<String, DatasetHandle> = HashMap::new();
    for dataset in datasets {
        if dataset.alias == base.alias || by_alias.contains_key(&dataset.alias) {
            return Err(TransformError::DuplicateAlias {
                alias: dataset.alias,
            });
        }
        by_alias.insert(dataset.alias.clone(), dataset);
    }

    let steps = config
        .joins
        .iter()
        .map(|join| {
            let right = by_alias.remove(&join.alias).ok_or_else(|| TransformError::InvalidJoinPredicate {
                message: format!("join names '{}', which is not a declared non-base source", join.alias),
            })?;
            Ok(JoinStep {
                right,
                kind: join.kind,
                conditions: join_conditions(join),
            })
        })
        .collect::<Result<Vec<_>, TransformError>>()?;
    Ok((base, steps))
}

fn bind_and_join(
    config: &TransformationConfig,
    source: &dyn LakehouseSource,
    timing: &mut StageTiming,
) -> Result<JoinedRelation, PipelineError> {
    let name = config.transformation.as_str();
    let datasets = run_stage(name, Stage::Bind, &mut timing.bind_secs, || bind_sources(config, source))?;
    tracing::info!(
        transformation = name,
        sources = datasets.len(),
        rows = datasets.iter().map(DatasetHandle::num_rows).sum::<usize>(),
        "Bound sources"
    );

    let relation = run_stage(name, Stage::Join, &mut timing.join_secs, || {
        let (base, steps) = join_steps(config, datasets)?;
        plan_joins(&base, &steps)
    })?;
    tracing::info!(
        transformation = name,
        joins = config.joins.len(),
        rows = relation.num_rows(),
        "Joined sources"
    );
    Ok(relation)
}

/// Bind, join and project without enriching or writing.
///
/// # Errors
///
/// `Infrastructure` if the definition is invalid, otherwise the first
/// failing stage.
pub fn plan_transformation(
    config: &TransformationConfig,
    source: &dyn LakehouseSource,
) -> Result<PlanResult, PipelineError> {
    validate_transformation(config)?;
    let mut timing = StageTiming::default();
    let relation = bind_and_join(config, source, &mut timing)?;
    let spec = run_stage(&config.transformation, Stage::Project, &mut timing.project_secs, || {
        build_projection(
            &relation,
            &column_mappings(config),
            config.metadata.is_dimension_output,
            &config.target,
        )
    })?;

    let columns = spec
        .entries()
        .iter()
        .map(|entry| PlannedColumn {
            name: entry.output_name.clone(),
            source: match &entry.source {
                ProjectionSource::Lineage(_) => "lineage".to_string(),
                ProjectionSource::Column(column) => column.to_string(),
            },
            aliased: entry.alias().is_some(),
        })
        .collect();

    Ok(PlanResult {
        transformation: config.transformation.clone(),
        target_table: config.target.clone(),
        aliases: relation.aliases().into_iter().map(str::to_string).collect(),
        joined_rows: relation.num_rows() as u64,
        columns,
    })
}

/// Run bind, join, project and enrich.
///
/// `keys` supplies surrogate keys for dimension outputs.
///
/// # Errors
///
/// `Infrastructure` if the definition is invalid, otherwise the first
/// failing stage.
pub fn prepare_transformation(
    config: &TransformationConfig,
    source: &dyn LakehouseSource,
    timestamp: LoadTimestamp,
    keys: &mut dyn KeyRangeAllocator,
) -> Result<PreparedTransformation, PipelineError> {
    validate_transformation(config)?;
    let name = config.transformation.as_str();
    let mut timing = StageTiming::default();

    let relation = bind_and_join(config, source, &mut timing)?;

    let (spec, business) = run_stage(name, Stage::Project, &mut timing.project_secs, || {
        let spec = build_projection(
            &relation,
            &column_mappings(config),
            config.metadata.is_dimension_output,
            &config.target,
        )?;
        let business = select_business(&relation, &spec)?;
        Ok((spec, business))
    })?;
    drop(relation);

    let (enricher, output) = run_stage(name, Stage::Enrich, &mut timing.enrich_secs, || {
        let enricher = MetadataEnricher::new(&config.metadata, timestamp)?;
        let output = enricher.enrich(&spec, &business, keys)?;
        Ok((enricher, output))
    })?;
    tracing::info!(
        transformation = name,
        columns = output.num_columns(),
        rows = output.num_rows(),
        dimension = config.metadata.is_dimension_output,
        "Projected and enriched output"
    );

    Ok(PreparedTransformation {
        result: TransformationResult::new(output, config.target.as_str(), &spec),
        spec,
        source_system: enricher.source_system().to_string(),
        load_timestamp_utc: enricher.timestamp_utc(),
        load_timestamp_local: enricher.timestamp_local(),
        timing,
    })
}

/// Run a transformation end to end with a fresh load timestamp and
/// run-scoped surrogate keys.
///
/// # Errors
///
/// `Infrastructure` if the definition is invalid, otherwise the first
/// failing stage.
pub fn run_transformation(
    config: &TransformationConfig,
    source: &dyn LakehouseSource,
    sink: &dyn LakehouseSink,
    options: &ExecutionOptions,
) -> Result<RunOutcome, PipelineError> {
    let mut keys = RunScopedKeys::new(config.metadata.surrogate_key_base_offset);
    run_transformation_with(config, source, sink, options, LoadTimestamp::now(), &mut keys)
}

/// [`run_transformation`] with a caller-supplied timestamp and key allocator.
///
/// # Errors
///
/// Same as [`run_transformation`].
pub fn run_transformation_with(
    config: &TransformationConfig,
    source: &dyn LakehouseSource,
    sink: &dyn LakehouseSink,
    options: &ExecutionOptions,
    timestamp: LoadTimestamp,
    keys: &mut dyn KeyRangeAllocator,
) -> Result<RunOutcome, PipelineError> {
    let start = Instant::now();
    let name = config.transformation.as_str();
    tracing::info!(
        transformation = name,
        target_table = config.target,
        dry_run = options.dry_run,
        "Starting transformation run"
    );

    let prepared = prepare_transformation(config, source, timestamp, keys)?;
    let output_columns: Vec<String> = prepared.spec.output_names().into_iter().map(str::to_string).collect();
    let mut timing = prepared.timing;

    if options.dry_run {
        let duration_secs = start.elapsed().as_secs_f64();
        tracing::info!(transformation = name, duration_secs, "Dry run completed, nothing written");
        return Ok(RunOutcome::DryRun(DryRunResult {
            transformation: config.transformation.clone(),
            target_table: config.target.clone(),
            output_columns,
            output: prepared.result.batch().clone(),
            timing,
            duration_secs,
        }));
    }

    let summary = run_stage(name, Stage::Write, &mut timing.write_secs, || {
        write_result(sink, prepared.result, config.write_mode)
    })?;

    let duration_secs = start.elapsed().as_secs_f64();
    tracing::info!(
        transformation = name,
        target_table = summary.table,
        rows_written = summary.rows_written,
        duration_secs,
        "Transformation run completed"
    );

    Ok(RunOutcome::Run(RunResult {
        transformation: config.transformation.clone(),
        target_table: summary.table,
        write_mode: summary.mode,
        rows_written: summary.rows_written,
        total_rows: summary.total_rows,
        output_columns,
        source_system: prepared.source_system,
        load_timestamp_utc: prepared.load_timestamp_utc,
        load_timestamp_local: prepared.load_timestamp_local,
        timing,
        duration_secs,
    }))
}

/// Validate a definition and its metadata configuration without touching
/// any lakehouse.
///
/// # Errors
///
/// `Infrastructure` for structural problems, or an `Enrich` stage error for
/// a missing source tag or unknown time zone.
pub fn check_transformation(config: &TransformationConfig) -> Result<(), PipelineError> {
    validate_transformation(config)?;
    MetadataEnricher::new(&config.metadata, LoadTimestamp::now())
        .map_err(PipelineError::at(Stage::Enrich))?;
    Ok(())
}
