//! Set-overlap distances on node identity and edge identity

use super::algorithm::{CompareError, GraphSimilarity};
use crate::graph_core::IntervalGraph;

fn common_nodes(a: &IntervalGraph, b: &IntervalGraph) -> usize {
    let (small, large) = if a.node_count() <= b.node_count() { (a, b) } else { (b, a) };
    small.nodes().filter(|n| large.contains_node(n)).count()
}

fn common_edges(a: &IntervalGraph, b: &IntervalGraph) -> usize {
    let (small, large) = if a.edge_count() <= b.edge_count() { (a, b) } else { (b, a) };
    small.edges().filter(|e| large.contains_edge(e)).count()
}

/// Ratio with the convention that two empty sets are identical
fn ratio(shared: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        shared as f64 / total as f64
    }
}

/// Maximum common subgraph under node-identity matching
///
/// Nodes are matched by `(kind, id)`, so the common subgraph is the set of nodes both
/// graphs contain. Similarity is its size over the larger graph's node count.
pub struct MaximumCommonSubgraph;

impl GraphSimilarity for MaximumCommonSubgraph {
    fn name(&self) -> &'static str {
        "MCS"
    }

    fn compare(&self, a: &IntervalGraph, b: &IntervalGraph) -> Result<f64, CompareError> {
        let largest = a.node_count().max(b.node_count());
        Ok(1.0 - ratio(common_nodes(a, b), largest))
    }
}

/// Product of node-set and edge-set Jaccard indices
pub struct Jaccard;

impl GraphSimilarity for Jaccard {
    fn name(&self) -> &'static str {
        "Jaccard"
    }

    fn compare(&self, a: &IntervalGraph, b: &IntervalGraph) -> Result<f64, CompareError> {
        let shared_nodes = common_nodes(a, b);
        let shared_edges = common_edges(a, b);

        let node_jaccard = ratio(shared_nodes, a.node_count() + b.node_count() - shared_nodes);
        let edge_jaccard = ratio(shared_edges, a.edge_count() + b.edge_count() - shared_edges);

        Ok(1.0 - node_jaccard * edge_jaccard)
    }
}

/// Vertex/edge overlap (VEO): `2 (|V∩| + |E∩|) / (|V1| + |V2| + |E1| + |E2|)`
pub struct VertexEdgeOverlap;

impl GraphSimilarity for VertexEdgeOverlap {
    fn name(&self) -> &'static str {
        "VertexEdgeOverlap"
    }

    fn compare(&self, a: &IntervalGraph, b: &IntervalGraph) -> Result<f64, CompareError> {
        let shared = common_nodes(a, b) + common_edges(a, b);
        let total = a.node_count() + b.node_count() + a.edge_count() + b.edge_count();
        Ok(1.0 - ratio(2 * shared, total))
    }
}
