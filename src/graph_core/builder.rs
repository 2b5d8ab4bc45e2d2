//! Slices an interaction stream into fixed intervals and builds one graph per interval

use super::event::InteractionEvent;
use super::interval_graph::{edge_key, EdgeKey, IntervalGraph, NodeKey};
use super::partition::PartitionSize;
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

/// Tags the dataset was collected for; they would connect every actor
pub const DEFAULT_EXCLUDED_TAGS: [&str; 2] = ["btc", "bitcoin"];

/// Event dropped while building, kept for later inspection
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEvent {
    pub timestamp: i64,
    pub reason: String,
}

/// Output of one build: contiguous interval graphs plus the skipped input records
#[derive(Debug, Clone)]
pub struct GraphSequence {
    pub partition: PartitionSize,
    pub graphs: Vec<IntervalGraph>,
    pub skipped: Vec<SkippedEvent>,
}

impl GraphSequence {
    pub fn non_empty_count(&self) -> usize {
        self.graphs.iter().filter(|g| !g.is_empty()).count()
    }
}

/// Reduce a link to its lowercased host, without a leading `www.`
///
/// Accepts full URLs as well as bare hosts such as `coindesk.com/markets`.
pub fn resolve_domain(link: &str) -> Option<String> {
    let trimmed = link.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = Url::parse(trimmed)
        .ok()
        .filter(|url| url.host_str().is_some())
        .or_else(|| Url::parse(&format!("http://{}", trimmed)).ok())?;

    let host = parsed.host_str()?.trim_end_matches('.').to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Mutable node/edge sets for the interval currently being filled
#[derive(Debug, Default)]
struct IntervalAccumulator {
    nodes: BTreeSet<NodeKey>,
    edges: BTreeSet<EdgeKey>,
}

impl IntervalAccumulator {
    fn add_event(
        &mut self,
        event: &InteractionEvent,
        excluded_tags: &BTreeSet<String>,
    ) -> Result<(), String> {
        let actor = event
            .actor()
            .ok_or_else(|| "event has no actor".to_string())?;
        let actor_node = NodeKey::user(actor);
        self.nodes.insert(actor_node.clone());

        for mention in &event.mentions {
            let mention = mention.trim();
            if mention.is_empty() || mention == actor {
                continue;
            }
            self.connect(&actor_node, NodeKey::user(mention));
        }

        for tag in &event.tags {
            let tag = tag.trim().trim_start_matches('#').to_lowercase();
            if tag.is_empty() || excluded_tags.contains(&tag) {
                continue;
            }
            self.connect(&actor_node, NodeKey::tag(tag));
        }

        for link in &event.links {
            match resolve_domain(link) {
                Some(domain) => self.connect(&actor_node, NodeKey::domain(domain)),
                None => log::debug!("Unresolvable link '{}' at {}", link, event.timestamp),
            }
        }

        Ok(())
    }

    fn connect(&mut self, actor: &NodeKey, other: NodeKey) {
        self.nodes.insert(other.clone());
        self.edges.insert(edge_key(actor.clone(), other));
    }

    /// Strip zero-degree nodes and freeze the interval
    fn finish(self, interval_start: i64, interval_end: i64) -> IntervalGraph {
        let mut degree: BTreeMap<&NodeKey, usize> = BTreeMap::new();
        for (a, b) in &self.edges {
            *degree.entry(a).or_default() += 1;
            *degree.entry(b).or_default() += 1;
        }

        let retained: BTreeSet<NodeKey> = self
            .nodes
            .iter()
            .filter(|node| degree.get(node).copied().unwrap_or(0) > 0)
            .cloned()
            .collect();

        let stripped = self.nodes.len() - retained.len();
        if stripped > 0 {
            log::trace!(
                "Interval {}: stripped {} zero-degree nodes",
                interval_start,
                stripped
            );
        }

        IntervalGraph::from_parts(interval_start, interval_end, retained, self.edges)
    }
}

pub struct TemporalGraphBuilder {
    excluded_tags: BTreeSet<String>,
}

impl TemporalGraphBuilder {
    /// Create a builder that ignores the given tags (matched case-insensitively)
    pub fn new<I, S>(excluded_tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            excluded_tags: excluded_tags
                .into_iter()
                .map(|t| t.as_ref().trim().trim_start_matches('#').to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_EXCLUDED_TAGS)
    }

    /// Partition `events` into contiguous intervals and build one graph per interval
    ///
    /// Intervals are half-open `[start, start + width)` and aligned to the epoch. Every
    /// interval between the first and last event is emitted, empty ones included.
    /// Events without an actor are skipped, logged and returned in `skipped`.
    pub fn build(&self, events: &[InteractionEvent], partition: PartitionSize) -> GraphSequence {
        let mut skipped = Vec::new();

        let (min_ts, max_ts) = match events.iter().map(|e| e.timestamp).fold(None, |acc, ts| {
            match acc {
                None => Some((ts, ts)),
                Some((lo, hi)) => Some((i64::min(lo, ts), i64::max(hi, ts))),
            }
        }) {
            Some(span) => span,
            None => {
                return GraphSequence {
                    partition,
                    graphs: Vec::new(),
                    skipped,
                }
            }
        };

        let width = partition.duration_secs();
        let first_start = partition.interval_start(min_ts);
        let last_start = partition.interval_start(max_ts);
        let interval_count = ((last_start - first_start) / width + 1) as usize;

        let mut accumulators: Vec<IntervalAccumulator> = (0..interval_count)
            .map(|_| IntervalAccumulator::default())
            .collect();

        for event in events {
            let slot = ((partition.interval_start(event.timestamp) - first_start) / width) as usize;
            if let Err(reason) = accumulators[slot].add_event(event, &self.excluded_tags) {
                log::warn!("⚠️  Skipping event at {}: {}", event.timestamp, reason);
                skipped.push(SkippedEvent {
                    timestamp: event.timestamp,
                    reason,
                });
            }
        }

        let graphs: Vec<IntervalGraph> = accumulators
            .into_iter()
            .enumerate()
            .map(|(i, acc)| {
                let start = first_start + i as i64 * width;
                acc.finish(start, start + width)
            })
            .collect();

        log::info!(
            "🕸️  Built {} interval graphs ({} non-empty, {} skipped events) at {}",
            graphs.len(),
            graphs.iter().filter(|g| !g.is_empty()).count(),
            skipped.len(),
            partition
        );

        GraphSequence {
            partition,
            graphs,
            skipped,
        }
    }

    /// Build a single interval graph from the given events, ignoring their timestamps
    pub fn build_interval<'a, I>(&self, interval_start: i64, interval_end: i64, events: I) -> IntervalGraph
    where
        I: IntoIterator<Item = &'a InteractionEvent>,
    {
        let mut acc = IntervalAccumulator::default();
        for event in events {
            if let Err(reason) = acc.add_event(event, &self.excluded_tags) {
                log::warn!("⚠️  Skipping event at {}: {}", event.timestamp, reason);
            }
        }
        acc.finish(interval_start, interval_end)
    }
}

impl Default for TemporalGraphBuilder {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_graph_invariants(graph: &IntervalGraph) {
        for (a, b) in graph.edges() {
            assert_ne!(a, b, "self-loop in interval {}", graph.interval_start);
        }
        for node in graph.nodes() {
            assert!(graph.degree(node) >= 1, "isolated node {}", node);
        }
    }

    #[test]
    fn test_five_minute_scenario() {
        let events = vec![
            InteractionEvent::new(30, "A").with_mention("B"),
            InteractionEvent::new(120, "A").with_tag("btc"),
            InteractionEvent::new(370, "C").with_mention("A"),
        ];

        let sequence = TemporalGraphBuilder::with_defaults().build(&events, PartitionSize::Min5);

        assert_eq!(sequence.graphs.len(), 2);
        assert_eq!(sequence.non_empty_count(), 2);

        let first = &sequence.graphs[0];
        assert_eq!((first.interval_start, first.interval_end), (0, 300));
        let nodes: Vec<&NodeKey> = first.nodes().collect();
        assert_eq!(nodes, vec![&NodeKey::user("A"), &NodeKey::user("B")]);
        assert!(first.contains_edge(&edge_key(NodeKey::user("A"), NodeKey::user("B"))));
        assert_eq!(first.edge_count(), 1);

        let second = &sequence.graphs[1];
        assert_eq!((second.interval_start, second.interval_end), (300, 600));
        let nodes: Vec<&NodeKey> = second.nodes().collect();
        assert_eq!(nodes, vec![&NodeKey::user("A"), &NodeKey::user("C")]);
        assert!(second.contains_edge(&edge_key(NodeKey::user("C"), NodeKey::user("A"))));

        for graph in &sequence.graphs {
            assert_graph_invariants(graph);
        }
    }

    #[test]
    fn test_gap_intervals_are_emitted_empty() {
        let events = vec![
            InteractionEvent::new(10, "A").with_mention("B"),
            InteractionEvent::new(1_000, "C").with_tag("defi"),
        ];

        let sequence = TemporalGraphBuilder::with_defaults().build(&events, PartitionSize::Min5);

        assert_eq!(sequence.graphs.len(), 4);
        assert!(sequence.graphs[1].is_empty());
        assert!(sequence.graphs[2].is_empty());
        for pair in sequence.graphs.windows(2) {
            assert_eq!(pair[0].interval_end, pair[1].interval_start);
        }
    }

    #[test]
    fn test_boundary_event_goes_to_next_interval() {
        let events = vec![
            InteractionEvent::new(0, "A").with_mention("B"),
            InteractionEvent::new(300, "C").with_mention("D"),
        ];

        let sequence = TemporalGraphBuilder::with_defaults().build(&events, PartitionSize::Min5);

        assert_eq!(sequence.graphs.len(), 2);
        assert!(sequence.graphs[1].contains_node(&NodeKey::user("C")));
        assert!(!sequence.graphs[0].contains_node(&NodeKey::user("C")));
    }

    #[test]
    fn test_self_mentions_and_lone_actors_leave_no_nodes() {
        let events = vec![
            InteractionEvent::new(5, "A").with_mention("A"),
            InteractionEvent::new(6, "B"),
            InteractionEvent::new(7, "C").with_tag("BITCOIN"),
        ];

        let sequence = TemporalGraphBuilder::with_defaults().build(&events, PartitionSize::Min15);

        assert_eq!(sequence.graphs.len(), 1);
        assert!(sequence.graphs[0].is_empty());
    }

    #[test]
    fn test_tags_and_domains_are_typed_and_lowercased() {
        let events = vec![InteractionEvent::new(5, "A")
            .with_tag("#Crypto")
            .with_link("https://WWW.CoinDesk.com/markets/x")
            .with_link("reddit.com/r/bitcoin")];

        let sequence = TemporalGraphBuilder::with_defaults().build(&events, PartitionSize::Hour1);
        let graph = &sequence.graphs[0];

        assert!(graph.contains_node(&NodeKey::tag("crypto")));
        assert!(graph.contains_node(&NodeKey::domain("coindesk.com")));
        assert!(graph.contains_node(&NodeKey::domain("reddit.com")));
        assert_eq!(graph.degree(&NodeKey::user("A")), 3);
        assert_graph_invariants(graph);
    }

    #[test]
    fn test_same_id_different_kind_are_distinct_nodes() {
        let events = vec![InteractionEvent::new(5, "A")
            .with_mention("eth")
            .with_tag("eth")];

        let sequence = TemporalGraphBuilder::with_defaults().build(&events, PartitionSize::Min5);
        assert_eq!(sequence.graphs[0].node_count(), 3);
    }

    #[test]
    fn test_missing_actor_is_skipped_not_fatal() {
        let mut orphan = InteractionEvent::new(40, "x").with_mention("B");
        orphan.actor_id = None;
        let events = vec![orphan, InteractionEvent::new(50, "A").with_mention("B")];

        let sequence = TemporalGraphBuilder::with_defaults().build(&events, PartitionSize::Min5);

        assert_eq!(sequence.skipped.len(), 1);
        assert_eq!(sequence.skipped[0].timestamp, 40);
        assert_eq!(sequence.graphs[0].node_count(), 2);
    }

    #[test]
    fn test_build_interval_is_idempotent() {
        let events = vec![
            InteractionEvent::new(1, "A").with_mention("B").with_tag("eth"),
            InteractionEvent::new(2, "B").with_mention("A"),
            InteractionEvent::new(3, "C").with_link("https://example.org"),
        ];
        let builder = TemporalGraphBuilder::with_defaults();

        let first = builder.build_interval(0, 300, &events);
        let second = builder.build_interval(0, 300, &events);

        assert_eq!(first.nodes().collect::<Vec<_>>(), second.nodes().collect::<Vec<_>>());
        assert_eq!(first.edges().collect::<Vec<_>>(), second.edges().collect::<Vec<_>>());
        assert_eq!(first.edge_count(), 3);
    }

    #[test]
    fn test_custom_exclusions() {
        let builder = TemporalGraphBuilder::new(["#ETH"]);
        let graph = builder.build_interval(0, 60, &[InteractionEvent::new(1, "A").with_tag("eth").with_tag("btc")]);

        assert!(!graph.contains_node(&NodeKey::tag("eth")));
        assert!(graph.contains_node(&NodeKey::tag("btc")));
    }

    #[test]
    fn test_empty_input() {
        let sequence = TemporalGraphBuilder::with_defaults().build(&[], PartitionSize::Min5);
        assert!(sequence.graphs.is_empty());
        assert!(sequence.skipped.is_empty());
    }

    #[test]
    fn test_resolve_domain() {
        assert_eq!(resolve_domain("https://www.example.com/a?b=c"), Some("example.com".to_string()));
        assert_eq!(resolve_domain("Example.ORG"), Some("example.org".to_string()));
        assert_eq!(resolve_domain("localhost:8080/path"), Some("localhost".to_string()));
        assert_eq!(resolve_domain("   "), None);
    }
}
