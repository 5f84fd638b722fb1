//! Output projection: lineage prefix first, then renamed business columns.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use arrow::datatypes::{Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use lakeform_types::{ColumnRef, LineageColumn, TransformError};

use crate::join::JoinedRelation;
use crate::naming::external_name;

/// Where an output column comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionSource {
    /// Computed by the metadata enricher.
    Lineage(LineageColumn),
    /// Copied from the joined relation.
    Column(ColumnRef),
}

impl fmt::Display for ProjectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lineage(column) => write!(f, "{column}"),
            Self::Column(column) => write!(f, "{column}"),
        }
    }
}

/// One `(source_reference, output_name)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionEntry {
    pub source: ProjectionSource,
    pub output_name: String,
}

impl ProjectionEntry {
    pub fn lineage(column: LineageColumn) -> Self {
        Self {
            source: ProjectionSource::Lineage(column),
            output_name: column.name().to_string(),
        }
    }

    pub fn column(column: ColumnRef, output_name: impl Into<String>) -> Self {
        Self {
            source: ProjectionSource::Column(column),
            output_name: output_name.into(),
        }
    }

    /// The alias of a business column, `None` when it keeps its own name.
    pub fn alias(&self) -> Option<&str> {
        match &self.source {
            ProjectionSource::Column(column) if column.name != self.output_name => {
                Some(&self.output_name)
            }
            _ => None,
        }
    }
}

/// A validated output column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionSpec {
    entries: Vec<ProjectionEntry>,
    is_dimension_output: bool,
}

impl ProjectionSpec {
    /// Check a complete entry list against the output conventions.
    ///
    /// Checks run in a fixed order, so the reported error is deterministic:
    /// `SurrogateKeyNotAllowed`, then `ProjectionOrder` for the lineage
    /// prefix, then per business entry `EmptyOutputName`,
    /// `InvalidOutputName` and `DuplicateOutputName`.
    ///
    /// # Errors
    ///
    /// The first convention violation found.
    pub fn validate(
        entries: Vec<ProjectionEntry>,
        is_dimension_output: bool,
        target: &str,
    ) -> Result<Self, TransformError> {
        let requests_key = entries
            .iter()
            .any(|e| e.source == ProjectionSource::Lineage(LineageColumn::SurrogateKey));
        if requests_key && !is_dimension_output {
            return Err(TransformError::SurrogateKeyNotAllowed {
                target: target.to_string(),
            });
        }

        let prefix = LineageColumn::prefix(is_dimension_output);
        for (position, expected) in prefix.iter().enumerate() {
            let in_place = entries.get(position).is_some_and(|e| {
                e.source == ProjectionSource::Lineage(*expected) && e.output_name == expected.name()
            });
            if !in_place {
                let found = entries
                    .get(position)
                    .map_or_else(|| "<end of projection>".to_string(), |e| e.source.to_string());
                return Err(TransformError::ProjectionOrder {
                    position,
                    expected: expected.name().to_string(),
                    found,
                });
            }
        }

        let mut names: HashSet<&str> = prefix.iter().map(|c| c.name()).collect();
        for entry in &entries[prefix.len()..] {
            match &entry.source {
                ProjectionSource::Lineage(column) => {
                    return Err(TransformError::DuplicateOutputName {
                        name: column.name().to_string(),
                    });
                }
                ProjectionSource::Column(column) => {
                    external_name(&column.name, Some(&entry.output_name), &column.to_string())?;
                }
            }
            if !names.insert(entry.output_name.as_str()) {
                return Err(TransformError::DuplicateOutputName {
                    name: entry.output_name.clone(),
                });
            }
        }

        Ok(Self {
            entries,
            is_dimension_output,
        })
    }

    pub fn entries(&self) -> &[ProjectionEntry] {
        &self.entries
    }

    pub fn is_dimension_output(&self) -> bool {
        self.is_dimension_output
    }

    /// The lineage prefix, in output order.
    pub fn lineage(&self) -> &'static [LineageColumn] {
        LineageColumn::prefix(self.is_dimension_output)
    }

    /// Entries after the lineage prefix.
    pub fn business(&self) -> &[ProjectionEntry] {
        &self.entries[self.lineage().len()..]
    }

    /// Every output column name, in order.
    pub fn output_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.output_name.as_str()).collect()
    }
}

/// A requested business column and its optional output name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub column: ColumnRef,
    /// `None` proposes the PascalCase form of the column name.
    pub name: Option<String>,
}

/// Build the projection for `relation` from business column mappings.
///
/// The lineage prefix is prepended automatically. Each mapped column is
/// resolved against the relation and stored fully qualified, so the output
/// order is exactly the mapping order.
///
/// # Errors
///
/// Resolution errors from the relation, naming errors from the naming
/// policy, or any [`ProjectionSpec::validate`] failure.
pub fn build_projection(
    relation: &JoinedRelation,
    mappings: &[ColumnMapping],
    is_dimension_output: bool,
    target: &str,
) -> Result<ProjectionSpec, TransformError> {
    let prefix = LineageColumn::prefix(is_dimension_output);
    let mut entries: Vec<ProjectionEntry> = prefix.iter().copied().map(ProjectionEntry::lineage).collect();
    entries.reserve(mappings.len());

    for mapping in mappings {
        let (binding, _) = relation.column(&mapping.column)?;
        let external = external_name(
            &binding.column,
            mapping.name.as_deref(),
            &mapping.column.to_string(),
        )?;
        entries.push(ProjectionEntry::column(
            ColumnRef::qualified(binding.alias.as_str(), binding.column.as_str()),
            external.name,
        ));
    }

    ProjectionSpec::validate(entries, is_dimension_output, target)
}

/// Materialize the business columns of `spec` from `relation`.
///
/// Fields keep their type and nullability under the output name.
///
/// # Errors
///
/// Resolution errors if `spec` was built for a different relation, or
/// `Evaluation` if the batch cannot be assembled.
pub fn select_business(
    relation: &JoinedRelation,
    spec: &ProjectionSpec,
) -> Result<RecordBatch, TransformError> {
    let mut fields = Vec::with_capacity(spec.business().len());
    let mut columns = Vec::with_capacity(spec.business().len());
    let schema = relation.batch().schema();

    for entry in spec.business() {
        let ProjectionSource::Column(column) = &entry.source else {
            continue;
        };
        let index = relation.resolve(column)?;
        let field = schema.field(index);
        fields.push(Field::new(
            entry.output_name.as_str(),
            field.data_type().clone(),
            field.is_nullable(),
        ));
        columns.push(relation.batch().column(index).clone());
    }

    RecordBatch::try_new_with_options(
        Arc::new(Schema::new(fields)),
        columns,
        &RecordBatchOptions::new().with_row_count(Some(relation.num_rows())),
    )
    .map_err(TransformError::evaluation)
}
