//! Transformation definition types deserialized from YAML.

use lakeform_types::lineage::{DEFAULT_LOCAL_TIMEZONE, DEFAULT_SURROGATE_KEY_BASE_OFFSET};
use lakeform_types::{ColumnRef, JoinKind, WriteMode};
use serde::{Deserialize, Serialize};

/// A complete transformation unit: sources, joins, projection and target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationConfig {
    pub version: String,
    pub transformation: String,
    pub target: String,
    #[serde(default)]
    pub write_mode: WriteMode,
    #[serde(default)]
    pub metadata: MetadataConfig,
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub joins: Vec<JoinConfig>,
    pub projection: Vec<ProjectionConfig>,
}

impl TransformationConfig {
    /// Source bound under `alias`, if any.
    pub fn source_by_alias(&self, alias: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.alias() == alias)
    }
}

/// Caller-supplied lineage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default)]
    pub source_system_tag: Option<String>,
    #[serde(default = "default_local_timezone")]
    pub local_timezone: String,
    #[serde(default = "default_surrogate_key_base_offset")]
    pub surrogate_key_base_offset: i64,
    #[serde(default)]
    pub is_dimension_output: bool,
}

fn default_local_timezone() -> String {
    DEFAULT_LOCAL_TIMEZONE.to_string()
}

fn default_surrogate_key_base_offset() -> i64 {
    DEFAULT_SURROGATE_KEY_BASE_OFFSET
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            source_system_tag: None,
            local_timezone: default_local_timezone(),
            surrogate_key_base_offset: default_surrogate_key_base_offset(),
            is_dimension_output: false,
        }
    }
}

/// One source table to bind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub table: String,
    /// Alias within the plan; defaults to the table name.
    #[serde(default)]
    pub alias: Option<String>,
    pub columns: Vec<String>,
}

impl SourceConfig {
    pub fn alias(&self) -> &str {
        self.alias
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(&self.table)
    }
}

/// Joins the source aliased `alias` onto everything bound before it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinConfig {
    pub alias: String,
    pub kind: JoinKind,
    /// Columns with the same name on both sides.
    #[serde(default)]
    pub using: Vec<String>,
    #[serde(default)]
    pub on: Vec<JoinPredicateConfig>,
}

impl JoinConfig {
    pub fn condition_count(&self) -> usize {
        self.using.len() + self.on.len()
    }
}

/// Equality predicate `left = right`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinPredicateConfig {
    pub left: ColumnRef,
    pub right: ColumnRef,
}

/// One business column of the output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionConfig {
    pub column: ColumnRef,
    /// Output name; defaults to the PascalCase form of the column name.
    #[serde(default)]
    pub name: Option<String>,
}
