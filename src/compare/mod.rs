//! Compare - Consecutive Graph Distances
//!
//! Every registered algorithm walks the interval graph sequence pairwise and
//! produces one distance series. Algorithms never see each other's failures.
//!
//! # Architecture
//!
//! ```text
//! [g0, g1, g2, ...] ──> GraphSequenceComparator
//!                          │  for each GraphSimilarity in AlgorithmRegistry
//!                          │    d(g0,g1), d(g1,g2), ...   (Missing on failure)
//!                          │  min/max normalization, round to 5 digits
//!                          ▼
//!                     DistanceSeries per algorithm
//! ```

pub mod algorithm;
pub mod bags;
pub mod comparator;
pub mod kernel;
pub mod overlap;
pub mod ranking;

pub use algorithm::{AlgorithmRegistry, CompareError, GraphSimilarity};
pub use comparator::{
    normalize_min_max, round_to, ComparisonStatistics, Distance, DistanceSample, DistanceSeries,
    GraphSequenceComparator,
};
