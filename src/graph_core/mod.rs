//! Graph Core - Temporal Interaction Graphs
//!
//! Turns an ordered stream of interaction events into a contiguous sequence of
//! per-interval graphs.
//!
//! # Architecture
//!
//! ```text
//! EventSource (SQLite / JSONL) → InteractionEvent
//!     ↓
//! TemporalGraphBuilder (5m / 15m / 1h half-open intervals)
//!     ↓
//! IntervalGraph per interval (user / tag / domain nodes, no isolated nodes)
//! ```

pub mod builder;
pub mod event;
pub mod interval_graph;
pub mod partition;

pub use builder::{GraphSequence, SkippedEvent, TemporalGraphBuilder, DEFAULT_EXCLUDED_TAGS};
pub use event::InteractionEvent;
pub use interval_graph::{edge_key, EdgeKey, IntervalGraph, NodeKey, NodeKind};
pub use partition::PartitionSize;
