//! Writer backend trait for analysis results
//!
//! Defines the interface for persisting distance, statistics, merged and causality
//! rows to different backends.

use super::rows::{CausalityRow, DistanceRow, MergedRow, RunKey, StatisticsRow};
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug)]
pub enum ResultWriterError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
    Database(String),
}

impl From<std::io::Error> for ResultWriterError {
    fn from(err: std::io::Error) -> Self {
        ResultWriterError::Io(err)
    }
}

impl From<serde_json::Error> for ResultWriterError {
    fn from(err: serde_json::Error) -> Self {
        ResultWriterError::Serialization(err)
    }
}

impl From<rusqlite::Error> for ResultWriterError {
    fn from(err: rusqlite::Error) -> Self {
        ResultWriterError::Database(err.to_string())
    }
}

impl std::fmt::Display for ResultWriterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultWriterError::Io(e) => write!(f, "IO error: {}", e),
            ResultWriterError::Serialization(e) => write!(f, "Serialization error: {}", e),
            ResultWriterError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for ResultWriterError {}

/// One row headed for one of the four result tables
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultRecord {
    Distance(DistanceRow),
    Statistics(StatisticsRow),
    Merged(MergedRow),
    Causality(CausalityRow),
}

impl ResultRecord {
    /// Table / file stem the record belongs to
    pub fn table(&self) -> &'static str {
        match self {
            ResultRecord::Distance(_) => "distances",
            ResultRecord::Statistics(_) => "statistics",
            ResultRecord::Merged(_) => "merged",
            ResultRecord::Causality(_) => "causality",
        }
    }
}

/// Backend trait for writing analysis results
#[async_trait]
pub trait ResultWriterBackend: Send {
    /// Write a single result row for the `(year, partition)` unit `key`
    async fn write(&mut self, key: RunKey, record: &ResultRecord) -> Result<(), ResultWriterError>;

    /// Flush pending writes to storage
    async fn flush(&mut self) -> Result<(), ResultWriterError>;

    /// Get backend type for logging
    fn backend_type(&self) -> &'static str;
}
