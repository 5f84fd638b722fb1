use std::path::Path;

use anyhow::{Context, Result};

use lakeform_engine::config::parser;
use lakeform_engine::orchestrator;
use lakeform_store::IpcLakehouse;

/// Execute the `plan` command: bind, join and project, then print the
/// output column order.
pub fn execute(definition: &Path, source_dir: &Path) -> Result<()> {
    let config = parser::parse_transformation(definition)
        .with_context(|| format!("Failed to parse transformation: {}", definition.display()))?;
    let source = IpcLakehouse::open(source_dir)
        .with_context(|| format!("Failed to open source lakehouse: {}", source_dir.display()))?;

    let plan = orchestrator::plan_transformation(&config, &source)?;

    println!("Transformation '{}' -> {}", plan.transformation, plan.target_table);
    println!("  Datasets:    {}", plan.aliases.join(", "));
    println!("  Joined rows: {}", plan.joined_rows);
    println!("  Columns:");
    for (position, column) in plan.columns.iter().enumerate() {
        let alias = if column.aliased { " (alias)" } else { "" };
        println!("    {position:>3}  {:<28} <- {}{alias}", column.name, column.source);
    }
    Ok(())
}
