//! Semantic validation for parsed transformation definitions.

use std::collections::HashSet;

use anyhow::{bail, Result};
use lakeform_types::LineageColumn;

use crate::config::types::TransformationConfig;

/// Validate a parsed transformation definition.
///
/// Checks the definition's structure only; table and column resolution
/// happens when the run binds its sources.
///
/// # Errors
///
/// Returns an error listing every validation failure found.
pub fn validate_transformation(config: &TransformationConfig) -> Result<()> {
    let mut errors = Vec::new();

    if config.version != "1.0" {
        errors.push(format!(
            "Unsupported transformation version '{}', expected '1.0'",
            config.version
        ));
    }
    if config.transformation.trim().is_empty() {
        errors.push("Transformation name must not be empty".to_string());
    }
    if config.target.trim().is_empty() {
        errors.push("Target table name must not be empty".to_string());
    }
    if config.metadata.is_dimension_output && config.metadata.surrogate_key_base_offset < 0 {
        errors.push("surrogate_key_base_offset must not be negative".to_string());
    }

    validate_sources(config, &mut errors);
    validate_joins(config, &mut errors);

    if config.projection.is_empty() {
        errors.push("Projection must list at least one business column".to_string());
    }
    for entry in &config.projection {
        if let Some(lineage) = entry.name.as_deref().and_then(LineageColumn::from_name) {
            errors.push(format!(
                "Projection of '{}' uses reserved lineage name '{lineage}'",
                entry.column
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        bail!("Transformation validation failed:\n  - {}", errors.join("\n  - "));
    }
}

fn validate_sources(config: &TransformationConfig, errors: &mut Vec<String>) {
    if config.sources.is_empty() {
        errors.push("At least one source must be declared".to_string());
    }

    let mut aliases = HashSet::new();
    for (i, source) in config.sources.iter().enumerate() {
        if source.table.trim().is_empty() {
            errors.push(format!("Source {i} has an empty table name"));
        }
        if !aliases.insert(source.alias()) {
            errors.push(format!("Alias '{}' is declared more than once", source.alias()));
        }
        if source.columns.is_empty() {
            errors.push(format!("Source '{}' requests no columns", source.alias()));
        }
        let mut seen = HashSet::new();
        for column in &source.columns {
            if !seen.insert(column.as_str()) {
                errors.push(format!(
                    "Source '{}' requests column '{column}' more than once",
                    source.alias()
                ));
            }
        }
    }
}

fn validate_joins(config: &TransformationConfig, errors: &mut Vec<String>) {
    let base = config.sources.first().map(|s| s.alias());
    let mut joined = HashSet::new();

    for join in &config.joins {
        if Some(join.alias.as_str()) == base {
            errors.push(format!(
                "Join on '{}' targets the base source, which is the left side of the first join",
                join.alias
            ));
        } else if config.source_by_alias(&join.alias).is_none() {
            errors.push(format!("Join on '{}' names an undeclared source", join.alias));
        }
        if !joined.insert(join.alias.as_str()) {
            errors.push(format!("Source '{}' is joined more than once", join.alias));
        }
        if join.condition_count() == 0 {
            errors.push(format!(
                "Join on '{}' must have at least one 'using' column or 'on' predicate",
                join.alias
            ));
        }
    }

    for source in config.sources.iter().skip(1) {
        if !joined.contains(source.alias()) {
            errors.push(format!(
                "Source '{}' is declared but never joined",
                source.alias()
            ));
        }
    }
}
