//! Transformation error taxonomy.
//!
//! Every failure a transformation run can report is a [`TransformError`].
//! Each variant belongs to one [`ErrorClass`]; none is retryable, and a run
//! never downgrades one to a warning.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Broad classification of a transformation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// A table, column or alias could not be resolved (bind/join time).
    Resolution,
    /// The caller broke a naming, ordering or metadata convention.
    Convention,
    /// The result could not be persisted.
    Persistence,
    /// The relational evaluator failed on otherwise valid input.
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Resolution => "resolution",
            Self::Convention => "convention",
            Self::Persistence => "persistence",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Bind,
    Join,
    Project,
    Enrich,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bind => "bind",
            Self::Join => "join",
            Self::Project => "project",
            Self::Enrich => "enrich",
            Self::Write => "write",
        };
        f.write_str(s)
    }
}

/// A failure reported by one of the transformation stages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TransformError {
    #[error("unknown table '{table}'")]
    UnknownTable { table: String },

    #[error("unknown column '{column}' in {scope}")]
    UnknownColumn { column: String, scope: String },

    #[error("ambiguous column '{column}': candidates {}", .candidates.join(", "))]
    AmbiguousColumn {
        column: String,
        candidates: Vec<String>,
    },

    #[error("join keys {left} and {right} have incompatible types: {message}")]
    JoinKeyTypeMismatch {
        left: String,
        right: String,
        message: String,
    },

    #[error("alias '{alias}' is used more than once in the plan")]
    DuplicateAlias { alias: String },

    #[error("column '{column}' is requested more than once from '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("no columns requested from '{table}'")]
    EmptyColumnList { table: String },

    #[error("invalid join predicate: {message}")]
    InvalidJoinPredicate { message: String },

    #[error("projection position {position} must be lineage column '{expected}', found '{found}'")]
    ProjectionOrder {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("output name '{name}' is produced more than once")]
    DuplicateOutputName { name: String },

    #[error("output name for '{reference}' is empty")]
    EmptyOutputName { reference: String },

    #[error("output name '{name}' for '{reference}' differs from the column name and is not PascalCase")]
    InvalidOutputName { name: String, reference: String },

    #[error("source system tag is missing")]
    MissingSourceTag,

    #[error("SurrogateKey requested for non-dimension output '{target}'")]
    SurrogateKeyNotAllowed { target: String },

    #[error("unknown time zone '{timezone}'")]
    InvalidTimezone { timezone: String },

    #[error("surrogate key allocation failed: {message}")]
    KeyAllocation { message: String },

    #[error("write conflict on '{table}': {reason}")]
    WriteConflict { table: String, reason: String },

    #[error("store failure: {message}")]
    Store { message: String },

    #[error("relation evaluation failed: {message}")]
    Evaluation { message: String },
}

impl TransformError {
    /// Classification of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownTable { .. }
            | Self::UnknownColumn { .. }
            | Self::AmbiguousColumn { .. }
            | Self::JoinKeyTypeMismatch { .. } => ErrorClass::Resolution,
            Self::DuplicateAlias { .. }
            | Self::DuplicateColumn { .. }
            | Self::EmptyColumnList { .. }
            | Self::InvalidJoinPredicate { .. }
            | Self::ProjectionOrder { .. }
            | Self::DuplicateOutputName { .. }
            | Self::EmptyOutputName { .. }
            | Self::InvalidOutputName { .. }
            | Self::MissingSourceTag
            | Self::SurrogateKeyNotAllowed { .. }
            | Self::InvalidTimezone { .. } => ErrorClass::Convention,
            Self::KeyAllocation { .. } | Self::WriteConflict { .. } | Self::Store { .. } => {
                ErrorClass::Persistence
            }
            Self::Evaluation { .. } => ErrorClass::Internal,
        }
    }

    /// Transformation errors are never retried within a run.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        false
    }

    /// Shorthand for [`TransformError::Evaluation`].
    pub fn evaluation(message: impl fmt::Display) -> Self {
        Self::Evaluation {
            message: message.to_string(),
        }
    }
}
