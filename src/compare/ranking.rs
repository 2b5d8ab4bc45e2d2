//! Vertex ranking distance: how much the PageRank ordering of nodes moved

use super::algorithm::{CompareError, GraphSimilarity};
use crate::graph_core::{IntervalGraph, NodeKey};
use std::collections::{BTreeMap, BTreeSet};

/// PageRank scores keyed by node
///
/// Power iteration on the undirected graph (each edge counts in both directions).
/// Interval graphs have no isolated nodes, so there is no dangling mass to redistribute.
pub fn pagerank(
    graph: &IntervalGraph,
    damping: f64,
    max_iterations: usize,
    tolerance: f64,
) -> BTreeMap<&NodeKey, f64> {
    let g = graph.graph();
    let n = g.node_count();
    if n == 0 {
        return BTreeMap::new();
    }

    let degree: Vec<f64> = g.node_indices().map(|i| g.neighbors(i).count() as f64).collect();
    let teleport = (1.0 - damping) / n as f64;
    let mut rank = vec![1.0 / n as f64; n];

    for _ in 0..max_iterations {
        let mut next = vec![teleport; n];
        for node in g.node_indices() {
            let inflow: f64 = g
                .neighbors(node)
                .map(|nb| rank[nb.index()] / degree[nb.index()].max(1.0))
                .sum();
            next[node.index()] += damping * inflow;
        }

        let delta: f64 = next.iter().zip(&rank).map(|(a, b)| (a - b).abs()).sum();
        rank = next;
        if delta < tolerance * n as f64 {
            break;
        }
    }

    g.node_indices().map(|i| (&g[i], rank[i.index()])).collect()
}

/// Average ranks (1-based), ties share the mean of their positions
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }
    ranks
}

/// Spearman rank correlation, `None` when either side has no rank variance
fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    let rx = average_ranks(x);
    let ry = average_ranks(y);
    let n = rx.len() as f64;
    let mx = rx.iter().sum::<f64>() / n;
    let my = ry.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (a, b) in rx.iter().zip(&ry) {
        cov += (a - mx) * (b - my);
        vx += (a - mx).powi(2);
        vy += (b - my).powi(2);
    }

    if vx <= f64::EPSILON || vy <= f64::EPSILON {
        None
    } else {
        Some((cov / (vx * vy).sqrt()).clamp(-1.0, 1.0))
    }
}

/// Rank correlation of PageRank scores over the union of both node sets
///
/// Nodes missing from one graph score 0 there. Similarity is `(ρ + 1) / 2`, so perfectly
/// preserved orderings give distance 0 and fully reversed ones give 1.
pub struct VertexRanking {
    pub damping: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for VertexRanking {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

impl GraphSimilarity for VertexRanking {
    fn name(&self) -> &'static str {
        "VertexRanking"
    }

    fn compare(&self, a: &IntervalGraph, b: &IntervalGraph) -> Result<f64, CompareError> {
        let pr_a = pagerank(a, self.damping, self.max_iterations, self.tolerance);
        let pr_b = pagerank(b, self.damping, self.max_iterations, self.tolerance);

        let union: BTreeSet<&NodeKey> = pr_a.keys().chain(pr_b.keys()).copied().collect();
        if union.is_empty() {
            return Ok(0.0);
        }

        let x: Vec<f64> = union.iter().map(|k| pr_a.get(k).copied().unwrap_or(0.0)).collect();
        let y: Vec<f64> = union.iter().map(|k| pr_b.get(k).copied().unwrap_or(0.0)).collect();

        let similarity = match spearman(&x, &y) {
            Some(rho) => (rho + 1.0) / 2.0,
            // Flat rankings: identical score vectors agree, anything else is uninformative
            None if x == y => 1.0,
            None => 0.5,
        };

        Ok(1.0 - similarity)
    }
}
