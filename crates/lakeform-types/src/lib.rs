//! Shared lakeform model types.
//!
//! Column references, join and write modes, the reserved lineage columns,
//! declared ingest schemas and the [`TransformError`](error::TransformError)
//! taxonomy. This crate is free of Arrow so both the store and the engine can
//! depend on it.

pub mod column;
pub mod error;
pub mod lineage;
pub mod schema;
pub mod wire;

pub use column::ColumnRef;
pub use error::{ErrorClass, Stage, TransformError};
pub use lineage::LineageColumn;
pub use schema::{ColumnSchema, ColumnType, TableSchema, TimestampUnit};
pub use wire::{JoinKind, WriteMode};
