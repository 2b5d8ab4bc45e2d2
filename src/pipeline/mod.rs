//! # Pipeline - Batch Orchestration
//!
//! Configuration and the engine that runs every `(year, partition)` unit.
//!
//! ```text
//! PipelineConfig::from_env ──> AnalysisEngine::from_config ──> run(&mut ResultWriter) ──> RunReport
//! ```

pub mod config;
pub mod engine;

pub use config::{BackendType, ConfigError, PipelineConfig};
pub use engine::{AnalysisEngine, EngineError, RunReport, UnitFailure, UnitSummary};
