//! Store error types.

use lakeform_types::TransformError;

/// Errors produced by [`LakehouseSource`](crate::LakehouseSource) and
/// [`LakehouseSink`](crate::LakehouseSink) implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The table does not exist in the lakehouse.
    #[error("table '{0}' not found")]
    UnknownTable(String),

    /// A requested column is absent from the table schema.
    #[error("column '{column}' not found in table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// The incoming batch cannot be written over the existing table.
    #[error("write conflict on '{table}': {reason}")]
    WriteConflict { table: String, reason: String },

    /// The table name cannot be mapped to storage.
    #[error("invalid table name '{0}'")]
    InvalidTableName(String),

    /// Arrow encode/decode or compute failure.
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// File-system I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal lock was poisoned by a panicked thread.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for TransformError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownTable(table) => Self::UnknownTable { table },
            StoreError::UnknownColumn { table, column } => Self::UnknownColumn {
                column,
                scope: format!("table '{table}'"),
            },
            StoreError::WriteConflict { table, reason } => Self::WriteConflict { table, reason },
            other => Self::Store {
                message: other.to_string(),
            },
        }
    }
}
