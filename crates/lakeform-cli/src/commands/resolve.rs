use std::path::Path;

use anyhow::Result;

use lakeform_engine::LakehouseMappings;

/// Execute the `resolve` command: print source and target paths as JSON.
pub fn execute(mappings: &Path, workspace: &str, lakehouse: &str, context: &str) -> Result<()> {
    let mappings = LakehouseMappings::load(mappings)?;
    let paths = mappings.resolve(workspace, lakehouse, context)?;
    println!("{}", serde_json::to_string_pretty(&paths)?);
    Ok(())
}
