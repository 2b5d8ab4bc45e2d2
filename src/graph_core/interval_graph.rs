//! Typed, undirected interaction graph for a single time interval

use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    User,
    Tag,
    Domain,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::User => "user",
            NodeKind::Tag => "tag",
            NodeKind::Domain => "domain",
        }
    }
}

/// Node identity inside and across interval graphs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeKey {
    pub kind: NodeKind,
    pub id: String,
}

impl NodeKey {
    pub fn new(kind: NodeKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self::new(NodeKind::User, id)
    }

    pub fn tag(id: impl Into<String>) -> Self {
        Self::new(NodeKind::Tag, id)
    }

    pub fn domain(id: impl Into<String>) -> Self {
        Self::new(NodeKind::Domain, id)
    }
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

/// Unordered edge stored with the smaller key first
pub type EdgeKey = (NodeKey, NodeKey);

pub fn edge_key(a: NodeKey, b: NodeKey) -> EdgeKey {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Immutable simple graph built from one interval's events
///
/// Construction guarantees no self-loops, no multi-edges and no isolated nodes.
#[derive(Debug, Clone)]
pub struct IntervalGraph {
    pub interval_start: i64,
    pub interval_end: i64,
    graph: UnGraph<NodeKey, ()>,
    index: BTreeMap<NodeKey, NodeIndex>,
    edges: BTreeSet<EdgeKey>,
}

impl IntervalGraph {
    pub fn empty(interval_start: i64, interval_end: i64) -> Self {
        Self::from_parts(interval_start, interval_end, BTreeSet::new(), BTreeSet::new())
    }

    /// Assemble the graph from already-deduplicated parts
    ///
    /// Self-loops are dropped, and nodes are only kept if at least one edge touches them.
    pub(crate) fn from_parts(
        interval_start: i64,
        interval_end: i64,
        nodes: BTreeSet<NodeKey>,
        edges: BTreeSet<EdgeKey>,
    ) -> Self {
        let edges: BTreeSet<EdgeKey> = edges.into_iter().filter(|(a, b)| a != b).collect();

        let mut touched: BTreeSet<&NodeKey> = BTreeSet::new();
        for (a, b) in &edges {
            touched.insert(a);
            touched.insert(b);
        }

        let mut graph = UnGraph::with_capacity(touched.len(), edges.len());
        let mut index = BTreeMap::new();
        for node in nodes.iter().filter(|n| touched.contains(n)) {
            index.insert(node.clone(), graph.add_node(node.clone()));
        }
        // Edge endpoints missing from `nodes` still belong to the graph
        for node in touched {
            if !index.contains_key(node) {
                index.insert(node.clone(), graph.add_node(node.clone()));
            }
        }
        for (a, b) in &edges {
            graph.add_edge(index[a], index[b], ());
        }

        Self {
            interval_start,
            interval_end,
            graph,
            index,
            edges,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Nodes in key order
    pub fn nodes(&self) -> impl Iterator<Item = &NodeKey> {
        self.index.keys()
    }

    /// Edges in key order, each with the smaller endpoint first
    pub fn edges(&self) -> impl Iterator<Item = &EdgeKey> {
        self.edges.iter()
    }

    pub fn contains_node(&self, node: &NodeKey) -> bool {
        self.index.contains_key(node)
    }

    pub fn contains_edge(&self, edge: &EdgeKey) -> bool {
        self.edges.contains(edge)
    }

    pub fn degree(&self, node: &NodeKey) -> usize {
        self.index
            .get(node)
            .map(|&idx| self.graph.neighbors(idx).count())
            .unwrap_or(0)
    }

    /// Neighbor keys of `node`, sorted
    pub fn neighbors(&self, node: &NodeKey) -> Vec<&NodeKey> {
        let mut neighbors: Vec<&NodeKey> = match self.index.get(node) {
            Some(&idx) => self.graph.neighbors(idx).map(|n| &self.graph[n]).collect(),
            None => Vec::new(),
        };
        neighbors.sort();
        neighbors
    }

    pub fn graph(&self) -> &UnGraph<NodeKey, ()> {
        &self.graph
    }
}
