use std::path::Path;

use anyhow::{Context, Result};

use lakeform_engine::config::parser;
use lakeform_engine::orchestrator;

/// Execute the `check` command: validate a definition without reading data.
pub fn execute(definition: &Path) -> Result<()> {
    let config = parser::parse_transformation(definition)
        .with_context(|| format!("Failed to parse transformation: {}", definition.display()))?;

    orchestrator::check_transformation(&config)?;

    tracing::info!(
        transformation = config.transformation,
        target_table = config.target,
        sources = config.sources.len(),
        joins = config.joins.len(),
        "Transformation validated"
    );
    println!("Transformation '{}': OK", config.transformation);
    Ok(())
}
