//! Bag-of-features distances: node bags and maximal-clique bags

use super::algorithm::{CompareError, GraphSimilarity};
use crate::graph_core::{IntervalGraph, NodeKey};
use std::collections::{BTreeMap, BTreeSet};

/// Cosine similarity of two sparse count vectors
pub(crate) fn cosine<K: Ord>(a: &BTreeMap<K, f64>, b: &BTreeMap<K, f64>) -> f64 {
    let norm_a: f64 = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b: f64 = b.values().map(|v| v * v).sum::<f64>().sqrt();

    if norm_a == 0.0 && norm_b == 0.0 {
        return 1.0;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(k, v)| large.get(k).map(|w| v * w))
        .sum();

    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// Cosine distance between the node bags of both graphs
pub struct BagOfNodes;

impl GraphSimilarity for BagOfNodes {
    fn name(&self) -> &'static str {
        "BagOfNodes"
    }

    fn compare(&self, a: &IntervalGraph, b: &IntervalGraph) -> Result<f64, CompareError> {
        let bag = |g: &IntervalGraph| -> BTreeMap<NodeKey, f64> {
            g.nodes().map(|n| (n.clone(), 1.0)).collect()
        };
        Ok(1.0 - cosine(&bag(a), &bag(b)))
    }
}

/// Cosine distance between the bags of maximal cliques of both graphs
///
/// Cliques are enumerated with Bron–Kerbosch (Tomita pivoting). Enumeration is
/// bounded by `max_cliques` per graph; exceeding it is reported as a failure.
pub struct BagOfCliques {
    pub max_cliques: usize,
}

impl Default for BagOfCliques {
    fn default() -> Self {
        Self {
            max_cliques: 200_000,
        }
    }
}

type Adjacency<'g> = BTreeMap<&'g NodeKey, BTreeSet<&'g NodeKey>>;

impl BagOfCliques {
    /// Maximal cliques of `graph`, each sorted, in discovery order
    pub fn maximal_cliques(&self, graph: &IntervalGraph) -> Result<Vec<Vec<NodeKey>>, CompareError> {
        let adjacency: Adjacency = graph
            .nodes()
            .map(|n| (n, graph.neighbors(n).into_iter().collect()))
            .collect();

        let mut cliques = Vec::new();
        let candidates: BTreeSet<&NodeKey> = adjacency.keys().copied().collect();
        self.expand(&adjacency, Vec::new(), candidates, BTreeSet::new(), &mut cliques)?;
        Ok(cliques)
    }

    fn expand<'g>(
        &self,
        adjacency: &Adjacency<'g>,
        clique: Vec<&'g NodeKey>,
        mut candidates: BTreeSet<&'g NodeKey>,
        mut excluded: BTreeSet<&'g NodeKey>,
        out: &mut Vec<Vec<NodeKey>>,
    ) -> Result<(), CompareError> {
        if candidates.is_empty() {
            if excluded.is_empty() && !clique.is_empty() {
                if out.len() >= self.max_cliques {
                    return Err(CompareError::BudgetExceeded {
                        algorithm: "BagOfCliques",
                        limit: self.max_cliques,
                    });
                }
                let mut found: Vec<NodeKey> = clique.into_iter().cloned().collect();
                found.sort();
                out.push(found);
            }
            return Ok(());
        }

        let empty = BTreeSet::new();
        let neighbors_of = |n: &NodeKey| adjacency.get(n).unwrap_or(&empty);

        // Pivot with the most neighbors among the candidates
        let pivot = candidates
            .iter()
            .chain(excluded.iter())
            .max_by_key(|u| neighbors_of(**u).intersection(&candidates).count())
            .copied();
        let pivot_neighbors = pivot.map(neighbors_of).unwrap_or(&empty);

        let branch: Vec<&NodeKey> = candidates.difference(pivot_neighbors).copied().collect();
        for v in branch {
            let nv = neighbors_of(v);
            let mut next_clique = clique.clone();
            next_clique.push(v);
            self.expand(
                adjacency,
                next_clique,
                candidates.intersection(nv).copied().collect(),
                excluded.intersection(nv).copied().collect(),
                out,
            )?;
            candidates.remove(v);
            excluded.insert(v);
        }

        Ok(())
    }
}

impl GraphSimilarity for BagOfCliques {
    fn name(&self) -> &'static str {
        "BagOfCliques"
    }

    fn compare(&self, a: &IntervalGraph, b: &IntervalGraph) -> Result<f64, CompareError> {
        let bag = |g: &IntervalGraph| -> Result<BTreeMap<Vec<NodeKey>, f64>, CompareError> {
            let mut counts = BTreeMap::new();
            for clique in self.maximal_cliques(g)? {
                *counts.entry(clique).or_insert(0.0) += 1.0;
            }
            Ok(counts)
        };
        Ok(1.0 - cosine(&bag(a)?, &bag(b)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::test_graphs::graph_from_edges;

    #[test]
    fn test_maximal_cliques_triangle_and_tail() {
        let g = graph_from_edges(&[("a", "b"), ("b", "c"), ("a", "c"), ("c", "d")]);
        let mut cliques = BagOfCliques::default().maximal_cliques(&g).unwrap();
        cliques.sort();

        assert_eq!(
            cliques,
            vec![
                vec![NodeKey::user("a"), NodeKey::user("b"), NodeKey::user("c")],
                vec![NodeKey::user("c"), NodeKey::user("d")],
            ]
        );
    }

    #[test]
    fn test_clique_budget_reported() {
        let g = graph_from_edges(&[("a", "b"), ("c", "d"), ("e", "f")]);
        let algorithm = BagOfCliques { max_cliques: 2 };

        let result = algorithm.compare(&g, &g);
        assert!(matches!(result, Err(CompareError::BudgetExceeded { limit: 2, .. })));
    }

    #[test]
    fn test_bag_distances() {
        let g1 = graph_from_edges(&[("a", "b"), ("c", "d")]);
        let g2 = graph_from_edges(&[("a", "b"), ("c", "e")]);

        // cliques {ab, cd} vs {ab, ce}: cosine 1/2
        let cliques = BagOfCliques::default().compare(&g1, &g2).unwrap();
        assert!((cliques - 0.5).abs() < 1e-12);

        // nodes 3 shared of 4 each: cosine 3/4
        let nodes = BagOfNodes.compare(&g1, &g2).unwrap();
        assert!((nodes - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_conventions() {
        let empty: BTreeMap<u8, f64> = BTreeMap::new();
        let one: BTreeMap<u8, f64> = [(1u8, 1.0)].into_iter().collect();
        assert_eq!(cosine(&empty, &empty), 1.0);
        assert_eq!(cosine(&empty, &one), 0.0);
        assert_eq!(cosine(&one, &one), 1.0);
    }
}
