//! Source-to-target lakehouse mappings.
//!
//! A mappings file is a JSON object keyed `"<workspace>|<lakehouse>|<context>"`.
//! The workspace and lakehouse in the key identify where a transformation
//! executes; the context names the transformation family. Each entry names
//! the source and target lakehouse, which resolve to OneLake `abfss://` paths.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const ONELAKE_HOST: &str = "onelake.dfs.fabric.microsoft.com";

/// One mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LakehouseMapping {
    pub source_workspace: String,
    pub source_lakehouse: String,
    pub target_workspace: String,
    pub target_lakehouse: String,
}

/// Resolved source and target root paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LakehousePaths {
    pub source_path: String,
    pub target_path: String,
}

/// All mappings of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LakehouseMappings {
    entries: BTreeMap<String, LakehouseMapping>,
}

/// Lookup key for an executing workspace, lakehouse and context.
pub fn mapping_key(workspace: &str, lakehouse: &str, context: &str) -> String {
    format!("{workspace}|{lakehouse}|{context}")
}

/// Root `abfss://` path of a lakehouse.
pub fn onelake_path(workspace: &str, lakehouse: &str) -> String {
    format!("abfss://{workspace}@{ONELAKE_HOST}/{lakehouse}.Lakehouse/")
}

impl LakehouseMappings {
    /// Read a mappings file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lakehouse mappings file: {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Invalid lakehouse mappings in {}", path.display()))
    }

    /// Parse mappings from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or an entry is incomplete.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse lakehouse mappings JSON")
    }

    pub fn get(&self, workspace: &str, lakehouse: &str, context: &str) -> Option<&LakehouseMapping> {
        self.entries.get(&mapping_key(workspace, lakehouse, context))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve the source and target paths for an executing context.
    ///
    /// # Errors
    ///
    /// Returns an error naming the key when no mapping exists.
    pub fn resolve(&self, workspace: &str, lakehouse: &str, context: &str) -> Result<LakehousePaths> {
        let key = mapping_key(workspace, lakehouse, context);
        let mapping = self
            .entries
            .get(&key)
            .with_context(|| format!("No lakehouse mapping for '{key}'"))?;
        Ok(LakehousePaths {
            source_path: onelake_path(&mapping.source_workspace, &mapping.source_lakehouse),
            target_path: onelake_path(&mapping.target_workspace, &mapping.target_lakehouse),
        })
    }
}
