//! Directory-backed lakehouse storing one Arrow IPC stream file per table.
//!
//! Table `name` lives at `<root>/<name>.arrows`. Writes go to a sibling
//! `.tmp` file that is renamed into place once fully written.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::ipc::reader::StreamReader;
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;
use lakeform_types::WriteMode;

use crate::backend::{project_columns, LakehouseSink, LakehouseSource, WriteSummary};
use crate::error::{self, StoreError};
use crate::memory::append_batch;

const TABLE_FILE_EXTENSION: &str = "arrows";
const IPC_STREAM_OVERHEAD_BYTES: usize = 1024;

/// Lakehouse rooted at a local directory.
#[derive(Debug)]
pub struct IpcLakehouse {
    root: PathBuf,
    write_guard: Mutex<()>,
}

impl IpcLakehouse {
    /// Open (creating if needed) a lakehouse rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory can't be created.
    pub fn open(root: impl AsRef<Path>) -> error::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            write_guard: Mutex::new(()),
        })
    }

    /// Root directory of this lakehouse.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of all tables, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory can't be listed.
    pub fn table_names(&self) -> error::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(TABLE_FILE_EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Read a whole table, `None` when its file does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the file can't be read or decoded.
    pub fn load_table(&self, table: &str) -> error::Result<Option<RecordBatch>> {
        let path = self.table_path(table)?;
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        decode_table(&bytes).map(Some)
    }

    fn table_path(&self, table: &str) -> error::Result<PathBuf> {
        let valid = !table.is_empty()
            && !table.starts_with('.')
            && !table.contains(['/', '\\'])
            && table != "..";
        if !valid {
            return Err(StoreError::InvalidTableName(table.to_string()));
        }
        Ok(self.root.join(format!("{table}.{TABLE_FILE_EXTENSION}")))
    }

    fn lock_writes(&self) -> error::Result<MutexGuard<'_, ()>> {
        self.write_guard.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl LakehouseSource for IpcLakehouse {
    fn table_schema(&self, table: &str) -> error::Result<SchemaRef> {
        self.load_table(table)?
            .map(|batch| batch.schema())
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }

    fn read_table(&self, table: &str, columns: &[String]) -> error::Result<RecordBatch> {
        let batch = self
            .load_table(table)?
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        project_columns(&batch, table, columns)
    }
}

impl LakehouseSink for IpcLakehouse {
    fn target_schema(&self, table: &str) -> error::Result<Option<SchemaRef>> {
        Ok(self.load_table(table)?.map(|batch| batch.schema()))
    }

    fn write_table(
        &self,
        batch: &RecordBatch,
        table: &str,
        mode: WriteMode,
    ) -> error::Result<WriteSummary> {
        let _guard = self.lock_writes()?;
        let path = self.table_path(table)?;

        let next = match (mode, self.load_table(table)?) {
            (WriteMode::Append, Some(existing)) => append_batch(&existing, batch, table)?,
            _ => batch.clone(),
        };

        let bytes = record_batch_to_ipc(&next)?;
        let tmp_path = path.with_extension(format!("{TABLE_FILE_EXTENSION}.tmp"));
        std::fs::write(&tmp_path, &bytes)?;
        if let Err(e) = std::fs::rename(&tmp_path, &path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        tracing::debug!(
            table,
            %mode,
            rows = batch.num_rows(),
            bytes = bytes.len(),
            path = %path.display(),
            "ipc lakehouse write"
        );

        Ok(WriteSummary {
            table: table.to_string(),
            mode,
            rows_written: batch.num_rows() as u64,
            total_rows: next.num_rows() as u64,
        })
    }
}

fn estimate_ipc_capacity(batch: &RecordBatch) -> usize {
    batch
        .get_array_memory_size()
        .saturating_add(IPC_STREAM_OVERHEAD_BYTES)
}

/// Serialize a RecordBatch to Arrow IPC stream format bytes.
///
/// # Errors
///
/// Returns [`StoreError::Arrow`] if encoding fails.
pub fn record_batch_to_ipc(batch: &RecordBatch) -> error::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(estimate_ipc_capacity(batch));
    let mut writer = StreamWriter::try_new(&mut buf, batch.schema().as_ref())?;
    writer.write(batch)?;
    writer.finish()?;
    drop(writer);
    Ok(buf)
}

/// Decode an IPC stream into a single batch.
///
/// # Errors
///
/// Returns [`StoreError::Arrow`] if the bytes are not a valid IPC stream.
pub fn decode_table(ipc_bytes: &[u8]) -> error::Result<RecordBatch> {
    let reader = StreamReader::try_new(Cursor::new(ipc_bytes), None)?;
    let schema = reader.schema();
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}
