//! Weisfeiler–Lehman subtree kernel distance

use super::algorithm::{CompareError, GraphSimilarity};
use super::bags::cosine;
use crate::graph_core::{IntervalGraph, NodeKey};
use std::collections::BTreeMap;

/// Normalized WL subtree kernel, `1 - k(a,b) / sqrt(k(a,a) k(b,b))`
///
/// Initial labels are the node keys. Each iteration relabels a node with its own label
/// followed by the sorted multiset of neighbor labels; the feature vector counts every
/// label seen across iterations `0..=iterations`.
pub struct WeisfeilerLehman {
    pub iterations: usize,
}

impl Default for WeisfeilerLehman {
    fn default() -> Self {
        Self { iterations: 1 }
    }
}

impl WeisfeilerLehman {
    pub fn features(&self, graph: &IntervalGraph) -> BTreeMap<String, f64> {
        let mut labels: BTreeMap<&NodeKey, String> =
            graph.nodes().map(|n| (n, n.to_string())).collect();

        let mut features = BTreeMap::new();
        for label in labels.values() {
            *features.entry(label.clone()).or_insert(0.0) += 1.0;
        }

        for round in 1..=self.iterations {
            let relabeled: BTreeMap<&NodeKey, String> = labels
                .iter()
                .map(|(node, own)| {
                    let mut around: Vec<&str> = graph
                        .neighbors(node)
                        .into_iter()
                        .filter_map(|nb| labels.get(nb).map(String::as_str))
                        .collect();
                    around.sort_unstable();
                    (*node, format!("{}#{}({})", round, own, around.join(",")))
                })
                .collect();

            for label in relabeled.values() {
                *features.entry(label.clone()).or_insert(0.0) += 1.0;
            }
            labels = relabeled;
        }

        features
    }
}

impl GraphSimilarity for WeisfeilerLehman {
    fn name(&self) -> &'static str {
        "WeisfeilerLehman"
    }

    fn compare(&self, a: &IntervalGraph, b: &IntervalGraph) -> Result<f64, CompareError> {
        Ok(1.0 - cosine(&self.features(a), &self.features(b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::test_graphs::graph_from_edges;

    #[test]
    fn test_feature_counts() {
        let g = graph_from_edges(&[("a", "b"), ("b", "c")]);
        let features = WeisfeilerLehman::default().features(&g);

        // 3 initial labels + 3 refined labels, all distinct
        assert_eq!(features.len(), 6);
        assert!(features.contains_key("1#user:b(user:a,user:c)"));
    }

    #[test]
    fn test_rewiring_is_detected_beyond_node_overlap() {
        // same node set, different wiring
        let path = graph_from_edges(&[("a", "b"), ("b", "c")]);
        let other = graph_from_edges(&[("a", "c"), ("c", "b")]);

        let wl = WeisfeilerLehman::default();
        assert!(wl.compare(&path, &path).unwrap().abs() < 1e-12);

        // 3 of 6 features shared: cosine 1/2
        let d = wl.compare(&path, &other).unwrap();
        assert!((d - 0.5).abs() < 1e-12);
    }
}
