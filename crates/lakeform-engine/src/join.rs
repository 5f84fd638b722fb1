//! Join planning over aliased datasets.
//!
//! Every column of a [`JoinedRelation`] stays addressable by the alias of the
//! dataset it came from. Physical field names are `alias.column`, so columns
//! with the same name on both sides never collide.
//!
//! Multi-way joins are a left fold: each step joins one more dataset onto the
//! relation accumulated so far.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, UInt32Array};
use arrow::compute::{can_cast_types, cast_with_options, take, CastOptions};
use arrow::datatypes::{DataType, Field, Schema, DECIMAL128_MAX_PRECISION};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::row::{RowConverter, SortField};
use lakeform_types::{ColumnRef, JoinKind, TransformError};

use crate::binder::DatasetHandle;

/// The dataset alias and column name behind one physical column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    pub alias: String,
    pub column: String,
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.column)
    }
}

/// A relation whose columns are bound to dataset aliases.
#[derive(Debug, Clone)]
pub struct JoinedRelation {
    batch: RecordBatch,
    scope: Vec<Binding>,
}

impl JoinedRelation {
    /// Wrap a bound dataset as a single-alias relation.
    ///
    /// # Errors
    ///
    /// `Evaluation` if the renamed batch cannot be rebuilt.
    pub fn from_dataset(dataset: &DatasetHandle) -> Result<Self, TransformError> {
        let schema = dataset.batch.schema();
        let scope: Vec<Binding> = schema
            .fields()
            .iter()
            .map(|f| Binding {
                alias: dataset.alias.clone(),
                column: f.name().clone(),
            })
            .collect();
        let fields: Vec<Field> = schema
            .fields()
            .iter()
            .zip(&scope)
            .map(|(f, b)| f.as_ref().clone().with_name(b.to_string()))
            .collect();
        let batch = RecordBatch::try_new_with_options(
            Arc::new(Schema::new(fields)),
            dataset.batch.columns().to_vec(),
            &RecordBatchOptions::new().with_row_count(Some(dataset.batch.num_rows())),
        )
        .map_err(TransformError::evaluation)?;
        Ok(Self { batch, scope })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn scope(&self) -> &[Binding] {
        &self.scope
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Distinct aliases in first-seen order.
    pub fn aliases(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.scope
            .iter()
            .map(|b| b.alias.as_str())
            .filter(|a| seen.insert(*a))
            .collect()
    }

    fn candidates(&self, column: &ColumnRef) -> Vec<usize> {
        self.scope
            .iter()
            .enumerate()
            .filter(|(_, b)| {
                b.column == column.name
                    && column.qualifier.as_ref().map_or(true, |q| *q == b.alias)
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn describe_scope(&self) -> String {
        format!("aliases [{}]", self.aliases().join(", "))
    }

    /// Physical column index of `column`.
    ///
    /// An unqualified name that exists under more than one alias is
    /// ambiguous; the relation never picks a side.
    ///
    /// # Errors
    ///
    /// `UnknownColumn` or `AmbiguousColumn`.
    pub fn resolve(&self, column: &ColumnRef) -> Result<usize, TransformError> {
        let found = self.candidates(column);
        match found.as_slice() {
            [index] => Ok(*index),
            [] => Err(TransformError::UnknownColumn {
                column: column.to_string(),
                scope: self.describe_scope(),
            }),
            many => Err(TransformError::AmbiguousColumn {
                column: column.to_string(),
                candidates: many.iter().map(|i| self.scope[*i].to_string()).collect(),
            }),
        }
    }

    /// Binding and array of `column`.
    ///
    /// # Errors
    ///
    /// Same as [`JoinedRelation::resolve`].
    pub fn column(&self, column: &ColumnRef) -> Result<(&Binding, &ArrayRef), TransformError> {
        let index = self.resolve(column)?;
        Ok((&self.scope[index], self.batch.column(index)))
    }
}

/// One equality condition of a join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinCondition {
    /// `left = right`; each side may name either input.
    On { left: ColumnRef, right: ColumnRef },
    /// Same column name on both sides. The left side is resolved in the
    /// accumulated relation, where it may be ambiguous.
    Using(String),
}

impl fmt::Display for JoinCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On { left, right } => write!(f, "{left} = {right}"),
            Self::Using(column) => write!(f, "USING ({column})"),
        }
    }
}

/// Join `right` onto the accumulated relation.
#[derive(Debug, Clone)]
pub struct JoinStep {
    pub right: DatasetHandle,
    pub kind: JoinKind,
    /// Conjunction of equality conditions.
    pub conditions: Vec<JoinCondition>,
}

/// Fold `steps` onto `base`, left to right.
///
/// # Errors
///
/// `DuplicateAlias` when two datasets share an alias, plus any error from
/// [`join`].
pub fn plan_joins(base: &DatasetHandle, steps: &[JoinStep]) -> Result<JoinedRelation, TransformError> {
    let mut aliases = HashSet::new();
    for alias in std::iter::once(&base.alias).chain(steps.iter().map(|s| &s.right.alias)) {
        if !aliases.insert(alias.as_str()) {
            return Err(TransformError::DuplicateAlias {
                alias: alias.clone(),
            });
        }
    }

    let mut relation = JoinedRelation::from_dataset(base)?;
    for step in steps {
        let right = JoinedRelation::from_dataset(&step.right)?;
        relation = join(&relation, &right, step.kind, &step.conditions)?;
    }
    Ok(relation)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

fn locate(
    left: &JoinedRelation,
    right: &JoinedRelation,
    column: &ColumnRef,
) -> Result<(Side, usize), TransformError> {
    let on_left = left.candidates(column);
    let on_right = right.candidates(column);
    match (on_left.as_slice(), on_right.as_slice()) {
        ([index], []) => Ok((Side::Left, *index)),
        ([], [index]) => Ok((Side::Right, *index)),
        ([], []) => {
            let mut aliases = left.aliases();
            aliases.extend(right.aliases());
            Err(TransformError::UnknownColumn {
                column: column.to_string(),
                scope: format!("aliases [{}]", aliases.join(", ")),
            })
        }
        (l, r) => Err(TransformError::AmbiguousColumn {
            column: column.to_string(),
            candidates: l
                .iter()
                .map(|i| left.scope[*i].to_string())
                .chain(r.iter().map(|i| right.scope[*i].to_string()))
                .collect(),
        }),
    }
}

/// Resolve conditions into `(left index, right index)` key pairs.
fn key_pairs(
    left: &JoinedRelation,
    right: &JoinedRelation,
    conditions: &[JoinCondition],
) -> Result<Vec<(usize, usize)>, TransformError> {
    if conditions.is_empty() {
        return Err(TransformError::InvalidJoinPredicate {
            message: format!(
                "join of [{}] has no conditions",
                right.aliases().join(", ")
            ),
        });
    }

    conditions
        .iter()
        .map(|condition| match condition {
            JoinCondition::Using(name) => {
                let column = ColumnRef::new(name.as_str());
                Ok((left.resolve(&column)?, right.resolve(&column)?))
            }
            JoinCondition::On { left: l, right: r } => {
                match (locate(left, right, l)?, locate(left, right, r)?) {
                    ((Side::Left, li), (Side::Right, ri)) | ((Side::Right, ri), (Side::Left, li)) => {
                        Ok((li, ri))
                    }
                    _ => Err(TransformError::InvalidJoinPredicate {
                        message: format!("'{condition}' compares two columns of the same input"),
                    }),
                }
            }
        })
        .collect()
}

fn row_index(i: usize) -> Result<u32, TransformError> {
    u32::try_from(i).map_err(|_| TransformError::Evaluation {
        message: format!("row index {i} exceeds join capacity"),
    })
}

/// Equality join of two relations.
///
/// Null keys never match. Output rows follow the left input; each left row
/// is followed by its matches in right order, and for right and full joins
/// unmatched right rows come last in right order. Columns of a side that can
/// be null-extended become nullable.
///
/// # Errors
///
/// `InvalidJoinPredicate`, `UnknownColumn`, `AmbiguousColumn`,
/// `JoinKeyTypeMismatch`, or `Evaluation` if a compute kernel fails.
pub fn join(
    left: &JoinedRelation,
    right: &JoinedRelation,
    kind: JoinKind,
    conditions: &[JoinCondition],
) -> Result<JoinedRelation, TransformError> {
    let pairs = key_pairs(left, right, conditions)?;

    let mut left_keys = Vec::with_capacity(pairs.len());
    let mut right_keys = Vec::with_capacity(pairs.len());
    let mut sort_fields = Vec::with_capacity(pairs.len());
    for &(li, ri) in &pairs {
        let (left_key, right_key) = align_keys(left, li, right, ri)?;
        sort_fields.push(SortField::new(left_key.data_type().clone()));
        left_keys.push(left_key);
        right_keys.push(right_key);
    }

    let converter = RowConverter::new(sort_fields).map_err(TransformError::evaluation)?;
    let left_rows = converter
        .convert_columns(&left_keys)
        .map_err(TransformError::evaluation)?;
    let right_rows = converter
        .convert_columns(&right_keys)
        .map_err(TransformError::evaluation)?;

    let has_null_key = |keys: &[ArrayRef], row: usize| keys.iter().any(|k| k.is_null(row));

    let mut index: HashMap<_, Vec<u32>> = HashMap::new();
    for row in 0..right.num_rows() {
        if !has_null_key(&right_keys, row) {
            index.entry(right_rows.row(row)).or_default().push(row_index(row)?);
        }
    }

    let mut left_take: Vec<Option<u32>> = Vec::with_capacity(left.num_rows());
    let mut right_take: Vec<Option<u32>> = Vec::with_capacity(left.num_rows());
    let mut right_matched = vec![false; right.num_rows()];

    for row in 0..left.num_rows() {
        let matches = if has_null_key(&left_keys, row) {
            None
        } else {
            index.get(&left_rows.row(row))
        };
        match matches {
            Some(matches) => {
                for &r in matches {
                    left_take.push(Some(row_index(row)?));
                    right_take.push(Some(r));
                    right_matched[r as usize] = true;
                }
            }
            None if kind.preserves_left() => {
                left_take.push(Some(row_index(row)?));
                right_take.push(None);
            }
            None => {}
        }
    }

    if kind.preserves_right() {
        for (row, matched) in right_matched.iter().enumerate() {
            if !matched {
                left_take.push(None);
                right_take.push(Some(row_index(row)?));
            }
        }
    }

    let num_rows = left_take.len();
    let left_indices = UInt32Array::from(left_take);
    let right_indices = UInt32Array::from(right_take);

    let mut fields = Vec::with_capacity(left.scope.len() + right.scope.len());
    let mut columns = Vec::with_capacity(fields.capacity());
    for (relation, indices, null_extended) in [
        (left, &left_indices, kind.preserves_right()),
        (right, &right_indices, kind.preserves_left()),
    ] {
        let schema = relation.batch.schema();
        for (field, column) in schema.fields().iter().zip(relation.batch.columns()) {
            let nullable = field.is_nullable() || null_extended;
            fields.push(field.as_ref().clone().with_nullable(nullable));
            columns.push(take(column.as_ref(), indices, None).map_err(TransformError::evaluation)?);
        }
    }

    let batch = RecordBatch::try_new_with_options(
        Arc::new(Schema::new(fields)),
        columns,
        &RecordBatchOptions::new().with_row_count(Some(num_rows)),
    )
    .map_err(TransformError::evaluation)?;

    let scope = left.scope.iter().chain(&right.scope).cloned().collect();

    tracing::debug!(
        kind = %kind,
        conditions = conditions.len(),
        left_rows = left.num_rows(),
        right_rows = right.num_rows(),
        rows = num_rows,
        "Joined relation"
    );

    Ok(JoinedRelation { batch, scope })
}

/// Both key columns cast to a common type that represents every value of
/// either side, so equality after the cast is equality of the originals.
fn align_keys(
    left: &JoinedRelation,
    li: usize,
    right: &JoinedRelation,
    ri: usize,
) -> Result<(ArrayRef, ArrayRef), TransformError> {
    let left_key = left.batch.column(li);
    let right_key = right.batch.column(ri);
    if left_key.data_type() == right_key.data_type() {
        return Ok((left_key.clone(), right_key.clone()));
    }

    let mismatch = |message: String| TransformError::JoinKeyTypeMismatch {
        left: left.scope[li].to_string(),
        right: right.scope[ri].to_string(),
        message,
    };
    let common = common_key_type(left_key.data_type(), right_key.data_type()).ok_or_else(|| {
        mismatch(format!(
            "{} cannot be compared with {} without losing values",
            left_key.data_type(),
            right_key.data_type()
        ))
    })?;

    let options = CastOptions {
        safe: false,
        ..CastOptions::default()
    };
    let cast_key = |key: &ArrayRef| -> Result<ArrayRef, TransformError> {
        if key.data_type() == &common {
            return Ok(key.clone());
        }
        if !can_cast_types(key.data_type(), &common) {
            return Err(mismatch(format!("{} cannot be cast to {common}", key.data_type())));
        }
        cast_with_options(key, &common, &options).map_err(|e| mismatch(e.to_string()))
    };
    Ok((cast_key(left_key)?, cast_key(right_key)?))
}

/// Integer digits needed for any value of an integer type.
fn integer_digits(data_type: &DataType) -> Option<u8> {
    match data_type {
        DataType::Int8 | DataType::UInt8 => Some(3),
        DataType::Int16 | DataType::UInt16 => Some(5),
        DataType::Int32 | DataType::UInt32 => Some(10),
        DataType::Int64 => Some(19),
        DataType::UInt64 => Some(20),
        _ => None,
    }
}

/// Smallest type both key types convert to without loss, if any.
///
/// Integers widen to 64 bits (a `UInt64` paired with a signed type goes to
/// `Decimal128(20, 0)`), integers with floats compare as `Float64`, decimals
/// widen to cover both sides, and numbers paired with text compare as their
/// canonical text. Any other differing pair has no common type.
fn common_key_type(left: &DataType, right: &DataType) -> Option<DataType> {
    use DataType::{Decimal128, Float16, Float32, Float64, LargeUtf8, Utf8};

    let is_float = |t: &DataType| matches!(t, Float16 | Float32 | Float64);
    let is_text = |t: &DataType| matches!(t, Utf8 | LargeUtf8);
    let is_numeric = |t: &DataType| {
        is_float(t) || integer_digits(t).is_some() || matches!(t, Decimal128(_, _))
    };

    if left == right {
        return Some(left.clone());
    }
    if is_text(left) && is_text(right) {
        return Some(Utf8);
    }
    if (is_text(left) && is_numeric(right)) || (is_numeric(left) && is_text(right)) {
        return Some(Utf8);
    }
    if is_float(left) || is_float(right) {
        let other = if is_float(left) { right } else { left };
        return (is_float(other) || integer_digits(other).is_some()).then_some(Float64);
    }
    match (left, right) {
        (Decimal128(_, _), _) | (_, Decimal128(_, _)) => {
            let digits = |t: &DataType| match t {
                Decimal128(p, s) => Some((i16::from(*p) - i16::from(*s), *s)),
                other => integer_digits(other).map(|d| (i16::from(d), 0)),
            };
            let (left_int, left_scale) = digits(left)?;
            let (right_int, right_scale) = digits(right)?;
            let scale = left_scale.max(right_scale);
            let precision = left_int.max(right_int) + i16::from(scale);
            let precision = u8::try_from(precision).ok().filter(|p| *p <= DECIMAL128_MAX_PRECISION)?;
            Some(Decimal128(precision, scale))
        }
        _ => {
            integer_digits(left)?;
            integer_digits(right)?;
            let unsigned = |t: &DataType| t.is_unsigned_integer();
            match (unsigned(left), unsigned(right)) {
                (true, true) => Some(DataType::UInt64),
                (false, false) => Some(DataType::Int64),
                _ if matches!(left, DataType::UInt64) || matches!(right, DataType::UInt64) => {
                    Some(Decimal128(20, 0))
                }
                _ => Some(DataType::Int64),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::bind_source;
    use crate::testing::{batch, field_names, int_values, ints, scenario_lakehouse, string_values, strs};
    use arrow::array::{BooleanArray, Float64Array};
    use lakeform_store::MemoryLakehouse;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn scenario(kind: JoinKind) -> JoinedRelation {
        let lake = scenario_lakehouse();
        let t1 = bind_source(&lake, "tableone", "t1", &cols(&["col1", "col2", "col3"])).unwrap();
        let t2 = bind_source(&lake, "tabletwo", "t2", &cols(&["col1", "col2", "col4"])).unwrap();
        plan_joins(
            &t1,
            &[JoinStep {
                right: t2,
                kind,
                conditions: vec![
                    JoinCondition::Using("col1".into()),
                    JoinCondition::Using("col2".into()),
                ],
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_columns_addressable_by_alias() {
        let rel = scenario(JoinKind::Inner);
        assert_eq!(
            field_names(rel.batch()),
            vec!["t1.col1", "t1.col2", "t1.col3", "t2.col1", "t2.col2", "t2.col4"]
        );
        assert_eq!(rel.aliases(), vec!["t1", "t2"]);
        assert_eq!(rel.resolve(&ColumnRef::qualified("t2", "col1")).unwrap(), 3);
        assert_eq!(rel.resolve(&ColumnRef::new("col4")).unwrap(), 5);
    }

    #[test]
    fn test_unqualified_shared_column_is_ambiguous() {
        let rel = scenario(JoinKind::Inner);
        let err = rel.resolve(&ColumnRef::new("col1")).unwrap_err();
        match err {
            TransformError::AmbiguousColumn { candidates, .. } => {
                assert_eq!(candidates, vec!["t1.col1", "t2.col1"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_inner_join_keeps_left_order() {
        let rel = scenario(JoinKind::Inner);
        assert_eq!(rel.num_rows(), 2);
        assert_eq!(int_values(rel.batch(), "t1.col1"), vec![Some(1), Some(2)]);
        assert_eq!(
            string_values(rel.batch(), "t2.col4"),
            vec![Some("y1".into()), Some("y2".into())]
        );
    }

    #[test]
    fn test_left_join_null_extends_right() {
        let rel = scenario(JoinKind::Left);
        assert_eq!(rel.num_rows(), 3);
        assert_eq!(int_values(rel.batch(), "t1.col1"), vec![Some(1), Some(2), Some(3)]);
        assert_eq!(
            string_values(rel.batch(), "t2.col4"),
            vec![Some("y1".into()), Some("y2".into()), None]
        );
        let schema = rel.batch().schema();
        assert!(schema.field_with_name("t2.col4").unwrap().is_nullable());
    }

    #[test]
    fn test_right_join_appends_unmatched_right_rows() {
        let rel = scenario(JoinKind::Right);
        assert_eq!(rel.num_rows(), 3);
        assert_eq!(int_values(rel.batch(), "t1.col1"), vec![Some(1), Some(2), None]);
        assert_eq!(int_values(rel.batch(), "t2.col1"), vec![Some(1), Some(2), Some(4)]);
    }

    #[test]
    fn test_full_join_keeps_both_sides() {
        let rel = scenario(JoinKind::Full);
        assert_eq!(rel.num_rows(), 4);
        assert_eq!(
            int_values(rel.batch(), "t1.col1"),
            vec![Some(1), Some(2), Some(3), None]
        );
        assert_eq!(
            int_values(rel.batch(), "t2.col1"),
            vec![Some(1), Some(2), None, Some(4)]
        );
    }

    #[test]
    fn test_null_keys_never_match() {
        let lake = MemoryLakehouse::new()
            .with_table("a", batch(vec![("k", ints(vec![None, Some(1)]))]))
            .with_table("b", batch(vec![("k", ints(vec![None, Some(1)]))]));
        let a = bind_source(&lake, "a", "a", &cols(&["k"])).unwrap();
        let b = bind_source(&lake, "b", "b", &cols(&["k"])).unwrap();
        let step = |kind| JoinStep {
            right: b.clone(),
            kind,
            conditions: vec![JoinCondition::Using("k".into())],
        };

        let inner = plan_joins(&a, &[step(JoinKind::Inner)]).unwrap();
        assert_eq!(inner.num_rows(), 1);

        let full = plan_joins(&a, &[step(JoinKind::Full)]).unwrap();
        assert_eq!(int_values(full.batch(), "a.k"), vec![None, Some(1), None]);
        assert_eq!(int_values(full.batch(), "b.k"), vec![None, Some(1), None]);
    }

    #[test]
    fn test_duplicate_matches_follow_right_order() {
        let lake = MemoryLakehouse::new()
            .with_table("a", batch(vec![("k", ints(vec![Some(1)]))]))
            .with_table(
                "b",
                batch(vec![
                    ("k", ints(vec![Some(1), Some(1)])),
                    ("v", strs(vec![Some("first"), Some("second")])),
                ]),
            );
        let a = bind_source(&lake, "a", "a", &cols(&["k"])).unwrap();
        let b = bind_source(&lake, "b", "b", &cols(&["k", "v"])).unwrap();
        let rel = plan_joins(
            &a,
            &[JoinStep {
                right: b,
                kind: JoinKind::Left,
                conditions: vec![JoinCondition::On {
                    left: ColumnRef::qualified("a", "k"),
                    right: ColumnRef::qualified("b", "k"),
                }],
            }],
        )
        .unwrap();
        assert_eq!(
            string_values(rel.batch(), "b.v"),
            vec![Some("first".into()), Some("second".into())]
        );
    }

    #[test]
    fn test_reversed_on_predicate_is_normalized() {
        let lake = scenario_lakehouse();
        let t1 = bind_source(&lake, "tableone", "t1", &cols(&["col1", "col3"])).unwrap();
        let t2 = bind_source(&lake, "tabletwo", "t2", &cols(&["col1", "col4"])).unwrap();
        let rel = plan_joins(
            &t1,
            &[JoinStep {
                right: t2,
                kind: JoinKind::Inner,
                conditions: vec![JoinCondition::On {
                    left: ColumnRef::qualified("t2", "col1"),
                    right: ColumnRef::qualified("t1", "col1"),
                }],
            }],
        )
        .unwrap();
        assert_eq!(rel.num_rows(), 2);
    }

    #[test]
    fn test_same_side_predicate_rejected() {
        let lake = scenario_lakehouse();
        let t1 = bind_source(&lake, "tableone", "t1", &cols(&["col1", "col2"])).unwrap();
        let t2 = bind_source(&lake, "tabletwo", "t2", &cols(&["col1"])).unwrap();
        let err = plan_joins(
            &t1,
            &[JoinStep {
                right: t2,
                kind: JoinKind::Inner,
                conditions: vec![JoinCondition::On {
                    left: ColumnRef::qualified("t1", "col1"),
                    right: ColumnRef::qualified("t1", "col2"),
                }],
            }],
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::InvalidJoinPredicate { .. }), "got: {err}");
    }

    #[test]
    fn test_no_conditions_rejected() {
        let lake = scenario_lakehouse();
        let t1 = bind_source(&lake, "tableone", "t1", &cols(&["col1"])).unwrap();
        let t2 = bind_source(&lake, "tabletwo", "t2", &cols(&["col1"])).unwrap();
        let err = plan_joins(
            &t1,
            &[JoinStep {
                right: t2,
                kind: JoinKind::Inner,
                conditions: vec![],
            }],
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::InvalidJoinPredicate { .. }));
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let lake = scenario_lakehouse();
        let t1 = bind_source(&lake, "tableone", "t", &cols(&["col1"])).unwrap();
        let t2 = bind_source(&lake, "tabletwo", "t", &cols(&["col1"])).unwrap();
        let err = plan_joins(
            &t1,
            &[JoinStep {
                right: t2,
                kind: JoinKind::Inner,
                conditions: vec![JoinCondition::Using("col1".into())],
            }],
        )
        .unwrap_err();
        assert_eq!(err, TransformError::DuplicateAlias { alias: "t".into() });
    }

    #[test]
    fn test_unknown_predicate_column() {
        let lake = scenario_lakehouse();
        let t1 = bind_source(&lake, "tableone", "t1", &cols(&["col1"])).unwrap();
        let t2 = bind_source(&lake, "tabletwo", "t2", &cols(&["col1"])).unwrap();
        let err = plan_joins(
            &t1,
            &[JoinStep {
                right: t2,
                kind: JoinKind::Inner,
                conditions: vec![JoinCondition::On {
                    left: ColumnRef::qualified("t1", "col1"),
                    right: ColumnRef::qualified("t2", "col9"),
                }],
            }],
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::UnknownColumn { ref column, .. } if column == "t2.col9"));
    }

    #[test]
    fn test_number_and_text_keys_compare_as_text() {
        let lake = MemoryLakehouse::new()
            .with_table("a", batch(vec![("k", ints(vec![Some(1), Some(2)]))]))
            .with_table("b", batch(vec![("k", strs(vec![Some("2")]))]));
        let a = bind_source(&lake, "a", "a", &cols(&["k"])).unwrap();
        let b = bind_source(&lake, "b", "b", &cols(&["k"])).unwrap();
        let rel = plan_joins(
            &a,
            &[JoinStep {
                right: b,
                kind: JoinKind::Inner,
                conditions: vec![JoinCondition::Using("k".into())],
            }],
        )
        .unwrap();
        assert_eq!(int_values(rel.batch(), "a.k"), vec![Some(2)]);
    }

    #[test]
    fn test_incomparable_key_types_rejected() {
        let lake = MemoryLakehouse::new()
            .with_table("a", batch(vec![("k", ints(vec![Some(1)]))]))
            .with_table(
                "b",
                batch(vec![("k", Arc::new(BooleanArray::from(vec![Some(true)])) as ArrayRef)]),
            );
        let a = bind_source(&lake, "a", "a", &cols(&["k"])).unwrap();
        let b = bind_source(&lake, "b", "b", &cols(&["k"])).unwrap();
        let err = plan_joins(
            &a,
            &[JoinStep {
                right: b,
                kind: JoinKind::Inner,
                conditions: vec![JoinCondition::Using("k".into())],
            }],
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::JoinKeyTypeMismatch { .. }), "got: {err}");
    }

    fn float_keys(values: Vec<Option<f64>>) -> ArrayRef {
        Arc::new(Float64Array::from(values))
    }

    fn join_on_k(lake: &MemoryLakehouse, kind: JoinKind) -> Result<JoinedRelation, TransformError> {
        let a = bind_source(lake, "a", "a", &cols(&["k"])).unwrap();
        let b = bind_source(lake, "b", "b", &cols(&["k"])).unwrap();
        plan_joins(
            &a,
            &[JoinStep {
                right: b,
                kind,
                conditions: vec![JoinCondition::Using("k".into())],
            }],
        )
    }

    #[test]
    fn test_int_and_float_keys_compare_without_truncation() {
        let lake = MemoryLakehouse::new()
            .with_table("a", batch(vec![("k", ints(vec![Some(2), Some(3)]))]))
            .with_table("b", batch(vec![("k", float_keys(vec![Some(2.5), Some(3.0)]))]));
        let rel = join_on_k(&lake, JoinKind::Inner).unwrap();
        assert_eq!(int_values(rel.batch(), "a.k"), vec![Some(3)]);

        let rel = join_on_k(&lake, JoinKind::Left).unwrap();
        assert_eq!(rel.num_rows(), 2);
        let matched = rel.batch().column(1);
        assert!(matched.is_null(0));
        assert!(matched.is_valid(1));
    }

    #[test]
    fn test_float_left_key_with_int_right_key() {
        let lake = MemoryLakehouse::new()
            .with_table("a", batch(vec![("k", float_keys(vec![Some(2.5)]))]))
            .with_table("b", batch(vec![("k", ints(vec![Some(2)]))]));
        let rel = join_on_k(&lake, JoinKind::Inner).unwrap();
        assert_eq!(rel.num_rows(), 0);
    }

    #[test]
    fn test_common_key_types() {
        assert_eq!(common_key_type(&DataType::Int32, &DataType::Int64), Some(DataType::Int64));
        assert_eq!(common_key_type(&DataType::UInt8, &DataType::UInt32), Some(DataType::UInt64));
        assert_eq!(common_key_type(&DataType::UInt16, &DataType::Int8), Some(DataType::Int64));
        assert_eq!(
            common_key_type(&DataType::UInt64, &DataType::Int64),
            Some(DataType::Decimal128(20, 0))
        );
        assert_eq!(common_key_type(&DataType::Int64, &DataType::Float32), Some(DataType::Float64));
        assert_eq!(
            common_key_type(&DataType::Decimal128(10, 2), &DataType::Int32),
            Some(DataType::Decimal128(12, 2))
        );
        assert_eq!(common_key_type(&DataType::Decimal128(38, 0), &DataType::Decimal128(10, 5)), None);
        assert_eq!(common_key_type(&DataType::Decimal128(10, 2), &DataType::Float64), None);
        assert_eq!(common_key_type(&DataType::Int64, &DataType::Utf8), Some(DataType::Utf8));
        assert_eq!(common_key_type(&DataType::Boolean, &DataType::Int64), None);
        assert_eq!(common_key_type(&DataType::Date32, &DataType::Int32), None);
    }

    #[test]
    fn test_three_way_fold() {
        let lake = scenario_lakehouse().with_table(
            "tablethree",
            batch(vec![
                ("col1", ints(vec![Some(3)])),
                ("col5", strs(vec![Some("z3")])),
            ]),
        );
        let t1 = bind_source(&lake, "tableone", "t1", &cols(&["col1", "col2"])).unwrap();
        let t2 = bind_source(&lake, "tabletwo", "t2", &cols(&["col1", "col2", "col4"])).unwrap();
        let t3 = bind_source(&lake, "tablethree", "t3", &cols(&["col1", "col5"])).unwrap();
        let rel = plan_joins(
            &t1,
            &[
                JoinStep {
                    right: t2,
                    kind: JoinKind::Left,
                    conditions: vec![
                        JoinCondition::Using("col1".into()),
                        JoinCondition::Using("col2".into()),
                    ],
                },
                JoinStep {
                    right: t3,
                    kind: JoinKind::Left,
                    conditions: vec![JoinCondition::On {
                        left: ColumnRef::qualified("t1", "col1"),
                        right: ColumnRef::qualified("t3", "col1"),
                    }],
                },
            ],
        )
        .unwrap();
        assert_eq!(rel.aliases(), vec!["t1", "t2", "t3"]);
        assert_eq!(
            string_values(rel.batch(), "t3.col5"),
            vec![None, None, Some("z3".into())]
        );
    }

    #[test]
    fn test_using_is_ambiguous_after_shared_column_join() {
        let lake = scenario_lakehouse().with_table(
            "tablethree",
            batch(vec![("col1", ints(vec![Some(1)]))]),
        );
        let t1 = bind_source(&lake, "tableone", "t1", &cols(&["col1"])).unwrap();
        let t2 = bind_source(&lake, "tabletwo", "t2", &cols(&["col1"])).unwrap();
        let t3 = bind_source(&lake, "tablethree", "t3", &cols(&["col1"])).unwrap();
        let using = || vec![JoinCondition::Using("col1".into())];
        let err = plan_joins(
            &t1,
            &[
                JoinStep {
                    right: t2,
                    kind: JoinKind::Inner,
                    conditions: using(),
                },
                JoinStep {
                    right: t3,
                    kind: JoinKind::Inner,
                    conditions: using(),
                },
            ],
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::AmbiguousColumn { .. }), "got: {err}");
    }
}
