//! Similarity algorithm trait and the registry the comparator iterates over

use super::bags::{BagOfCliques, BagOfNodes};
use super::kernel::WeisfeilerLehman;
use super::overlap::{Jaccard, MaximumCommonSubgraph, VertexEdgeOverlap};
use super::ranking::VertexRanking;
use crate::graph_core::IntervalGraph;

#[derive(Debug)]
pub enum CompareError {
    /// The algorithm gave up because the input exceeded its work budget
    BudgetExceeded { algorithm: &'static str, limit: usize },
    /// The algorithm produced NaN or an infinite score
    NonFinite { algorithm: &'static str, value: f64 },
    UnknownAlgorithm(String),
    Computation(String),
}

impl std::fmt::Display for CompareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareError::BudgetExceeded { algorithm, limit } => {
                write!(f, "{} exceeded its budget of {}", algorithm, limit)
            }
            CompareError::NonFinite { algorithm, value } => {
                write!(f, "{} produced a non-finite distance: {}", algorithm, value)
            }
            CompareError::UnknownAlgorithm(name) => write!(f, "Unknown algorithm: {}", name),
            CompareError::Computation(msg) => write!(f, "Computation error: {}", msg),
        }
    }
}

impl std::error::Error for CompareError {}

/// Pairwise graph comparison strategy
///
/// Implementations return a raw distance; higher means more structural change.
/// They must not rely on the comparator's empty-graph short-circuit for correctness.
pub trait GraphSimilarity: Send + Sync {
    /// Stable name used as the column / table key
    fn name(&self) -> &'static str;

    /// Raw distance between two interval graphs
    fn compare(&self, a: &IntervalGraph, b: &IntervalGraph) -> Result<f64, CompareError>;
}

/// Ordered set of independently constructed comparison strategies
#[derive(Default)]
pub struct AlgorithmRegistry {
    algorithms: Vec<Box<dyn GraphSimilarity>>,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in algorithm, in reporting order
    pub fn with_defaults() -> Self {
        Self::new()
            .with(MaximumCommonSubgraph)
            .with(Jaccard)
            .with(VertexRanking::default())
            .with(VertexEdgeOverlap)
            .with(BagOfCliques::default())
            .with(BagOfNodes)
            .with(WeisfeilerLehman::default())
    }

    pub fn with(mut self, algorithm: impl GraphSimilarity + 'static) -> Self {
        self.register(Box::new(algorithm));
        self
    }

    pub fn register(&mut self, algorithm: Box<dyn GraphSimilarity>) {
        if self.algorithms.iter().any(|a| a.name() == algorithm.name()) {
            log::warn!("Algorithm {} registered twice, replacing", algorithm.name());
            self.algorithms.retain(|a| a.name() != algorithm.name());
        }
        self.algorithms.push(algorithm);
    }

    /// Keep only the named algorithms (case-insensitive), preserving registry order
    pub fn select<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self, CompareError> {
        let wanted: Vec<String> = names.iter().map(|n| n.as_ref().trim().to_lowercase()).collect();

        if let Some(unknown) = wanted
            .iter()
            .find(|w| !self.algorithms.iter().any(|a| a.name().to_lowercase() == **w))
        {
            return Err(CompareError::UnknownAlgorithm(unknown.clone()));
        }

        self.algorithms
            .retain(|a| wanted.contains(&a.name().to_lowercase()));
        Ok(self)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.algorithms.iter().map(|a| a.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn GraphSimilarity> {
        self.algorithms.iter().map(|a| a.as_ref())
    }

    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}
