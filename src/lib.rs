//! socialflow: social interaction graphs against market prices
//!
//! Interaction events are bucketed into interval graphs, consecutive graphs are
//! compared with several similarity measures, and the resulting distance series are
//! tested for Granger causality against a close-price series.

pub mod compare;
pub mod graph_core;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod sqlite_pragma;
pub mod stats;
