//! Output - Result Tables
//!
//! Distance samples, comparison statistics, merged price/distance series and
//! causality results, written per `(year, partition)` unit.
//!
//! # Architecture
//!
//! ```text
//! AnalysisEngine ──ResultRecord──> ResultWriter
//!                                     ├── Jsonl  → <base>/<year>/<partition>/<table>.jsonl
//!                                     └── Sqlite → distance_samples, comparison_statistics,
//!                                                  merged_series, causality_results
//! ```

pub mod jsonl_writer;
pub mod rows;
pub mod sqlite_writer;
pub mod writer;
pub mod writer_backend;

pub use jsonl_writer::JsonlResultWriter;
pub use rows::{
    format_timestamp, CausalityRow, CausalityStatus, DistanceRow, Hypothesis, MergedRow, RunKey,
    StatisticsRow, ERROR_ENCOUNTERED, NOT_STATIONARY,
};
pub use sqlite_writer::SqliteResultWriter;
pub use writer::ResultWriter;
pub use writer_backend::{ResultRecord, ResultWriterBackend, ResultWriterError};
