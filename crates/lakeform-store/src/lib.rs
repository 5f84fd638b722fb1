//! Lakehouse storage for lakeform transformations.
//!
//! Provides the [`LakehouseSource`] and [`LakehouseSink`] traits plus two
//! implementations: [`MemoryLakehouse`] for tests and embedding, and
//! [`IpcLakehouse`], a directory of Arrow IPC stream files.

#![warn(clippy::pedantic)]

pub mod backend;
pub mod error;
pub mod ipc;
pub mod memory;

pub use backend::{LakehouseSink, LakehouseSource, WriteSummary};
pub use error::StoreError;
pub use ipc::IpcLakehouse;
pub use memory::MemoryLakehouse;
