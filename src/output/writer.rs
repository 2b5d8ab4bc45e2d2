//! Unified writer interface for analysis results
//!
//! Routes writes to either JSONL or SQLite backend based on configuration.

use super::jsonl_writer::JsonlResultWriter;
use super::rows::RunKey;
use super::sqlite_writer::SqliteResultWriter;
use super::writer_backend::{ResultRecord, ResultWriterBackend, ResultWriterError};
use crate::pipeline::config::BackendType;
use std::path::PathBuf;

/// Unified writer that routes to either JSONL or SQLite backend
pub enum ResultWriter {
    Jsonl(JsonlResultWriter),
    Sqlite(SqliteResultWriter),
}

impl ResultWriter {
    /// Create a new result writer based on backend type
    ///
    /// # Arguments
    /// * `backend` - Output backend
    /// * `output_path` - Base directory for JSONL, database file for SQLite
    pub fn new(backend: BackendType, output_path: PathBuf) -> Result<Self, ResultWriterError> {
        match backend {
            BackendType::Jsonl => Ok(ResultWriter::Jsonl(JsonlResultWriter::new(output_path)?)),
            BackendType::Sqlite => Ok(ResultWriter::Sqlite(SqliteResultWriter::new(output_path)?)),
        }
    }

    pub async fn write(&mut self, key: RunKey, record: &ResultRecord) -> Result<(), ResultWriterError> {
        match self {
            ResultWriter::Jsonl(w) => w.write(key, record).await,
            ResultWriter::Sqlite(w) => w.write(key, record).await,
        }
    }

    /// Write every record in order, stopping at the first failure
    pub async fn write_all(
        &mut self,
        key: RunKey,
        records: Vec<ResultRecord>,
    ) -> Result<usize, ResultWriterError> {
        let mut written = 0;
        for record in &records {
            self.write(key, record).await?;
            written += 1;
        }
        Ok(written)
    }

    /// Flush pending writes to storage
    pub async fn flush(&mut self) -> Result<(), ResultWriterError> {
        match self {
            ResultWriter::Jsonl(w) => w.flush().await,
            ResultWriter::Sqlite(w) => w.flush().await,
        }
    }

    /// Get backend type for logging
    pub fn backend_type(&self) -> &'static str {
        match self {
            ResultWriter::Jsonl(w) => w.backend_type(),
            ResultWriter::Sqlite(w) => w.backend_type(),
        }
    }
}
