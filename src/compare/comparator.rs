//! Pairwise walk over consecutive interval graphs, one distance series per algorithm

use super::algorithm::{AlgorithmRegistry, CompareError, GraphSimilarity};
use crate::graph_core::IntervalGraph;
use crate::stats::TimeSeries;
use serde::Serialize;
use std::time::Instant;

/// Comparisons between progress log lines
const PROGRESS_EVERY: usize = 5000;
const DISTANCE_DIGITS: i32 = 5;

/// Distance of one graph pair; `Missing` keeps the index when the algorithm failed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Distance {
    Value(f64),
    Missing,
}

impl Distance {
    pub fn value(&self) -> Option<f64> {
        match self {
            Distance::Value(v) => Some(*v),
            Distance::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Distance::Missing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceSample {
    /// Start of the earlier interval
    pub from_interval: i64,
    /// Start of the later interval
    pub to_interval: i64,
    /// End of the later interval; the sample's position on the time axis
    pub timestamp: i64,
    pub node_count_1: usize,
    pub node_count_2: usize,
    /// Computation time in seconds
    pub duration: f64,
    pub distance: Distance,
    /// Why the distance is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonStatistics {
    pub algorithm: String,
    pub mean_duration_secs: f64,
    pub mean_node_size: u64,
    pub samples: usize,
    pub missing: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistanceSeries {
    pub algorithm: String,
    pub samples: Vec<DistanceSample>,
}

impl DistanceSeries {
    /// Measured distances keyed by sample timestamp; missing samples are left out
    pub fn to_time_series(&self) -> TimeSeries {
        let points = self
            .samples
            .iter()
            .filter_map(|s| s.distance.value().map(|v| (s.timestamp, v)))
            .collect();
        TimeSeries::from_unordered(self.algorithm.clone(), points)
    }

    pub fn missing_count(&self) -> usize {
        self.samples.iter().filter(|s| s.distance.is_missing()).count()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean duration and mean node size over all compared pairs
    pub fn statistics(&self) -> ComparisonStatistics {
        let n = self.samples.len();
        let (mean_duration_secs, mean_node_size) = if n == 0 {
            (0.0, 0)
        } else {
            let n = n as f64;
            let duration = self.samples.iter().map(|s| s.duration).sum::<f64>() / n;
            let g1 = self.samples.iter().map(|s| s.node_count_1 as f64).sum::<f64>() / n;
            let g2 = self.samples.iter().map(|s| s.node_count_2 as f64).sum::<f64>() / n;
            (round_to(duration, DISTANCE_DIGITS), ((g1 + g2) / 2.0).round_ties_even() as u64)
        };

        ComparisonStatistics {
            algorithm: self.algorithm.clone(),
            mean_duration_secs,
            mean_node_size,
            samples: n,
            missing: self.missing_count(),
        }
    }
}

/// Round to `digits` decimal places, ties to even
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round_ties_even() / factor
}

/// Rescale measured values linearly onto [0, 1]
///
/// Missing entries stay missing and do not take part in min/max. When every measured
/// value is equal the result is all zeros.
pub fn normalize_min_max(values: &mut [Distance]) {
    let measured = values.iter().filter_map(Distance::value);
    let (min, max) = measured.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return;
    }

    let range = max - min;
    for value in values.iter_mut() {
        if let Distance::Value(v) = value {
            *v = if range > 0.0 { (*v - min) / range } else { 0.0 };
        }
    }
}

pub struct GraphSequenceComparator {
    registry: AlgorithmRegistry,
    normalize: bool,
}

impl GraphSequenceComparator {
    pub fn new(registry: AlgorithmRegistry, normalize: bool) -> Self {
        Self {
            registry,
            normalize,
        }
    }

    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    /// One distance series per registered algorithm, in registry order
    ///
    /// # Arguments
    /// * `graphs` - Contiguous interval graphs; fewer than two yield empty series
    pub fn compare(&self, graphs: &[IntervalGraph]) -> Vec<DistanceSeries> {
        self.registry
            .iter()
            .map(|algorithm| self.compare_algorithm(algorithm, graphs))
            .collect()
    }

    pub fn compare_algorithm(
        &self,
        algorithm: &dyn GraphSimilarity,
        graphs: &[IntervalGraph],
    ) -> DistanceSeries {
        let name = algorithm.name();
        let total = graphs.len().saturating_sub(1);
        log::info!("📐 {}: comparing {} graph pairs", name, total);

        let mut samples = Vec::with_capacity(total);
        for (i, pair) in graphs.windows(2).enumerate() {
            let (g1, g2) = (&pair[0], &pair[1]);

            let started = Instant::now();
            let outcome = if g1.is_empty() && g2.is_empty() {
                Ok(0.0)
            } else {
                algorithm.compare(g1, g2).and_then(|d| {
                    if d.is_finite() {
                        Ok(d)
                    } else {
                        Err(CompareError::NonFinite {
                            algorithm: name,
                            value: d,
                        })
                    }
                })
            };
            let duration = round_to(started.elapsed().as_secs_f64(), DISTANCE_DIGITS);

            let (distance, failure) = match outcome {
                Ok(d) => (Distance::Value(d), None),
                Err(e) => {
                    log::warn!(
                        "⚠️  {} failed on intervals {} → {}: {}",
                        name,
                        g1.interval_start,
                        g2.interval_start,
                        e
                    );
                    (Distance::Missing, Some(e.to_string()))
                }
            };

            samples.push(DistanceSample {
                from_interval: g1.interval_start,
                to_interval: g2.interval_start,
                timestamp: g2.interval_end,
                node_count_1: g1.node_count(),
                node_count_2: g2.node_count(),
                duration,
                distance,
                failure,
            });

            if (i + 1) % PROGRESS_EVERY == 0 {
                log::info!("   {} - compared {} of {} pairs", name, i + 1, total);
            }
        }

        let mut distances: Vec<Distance> = samples.iter().map(|s| s.distance).collect();
        if self.normalize {
            normalize_min_max(&mut distances);
        }
        for (sample, distance) in samples.iter_mut().zip(distances) {
            sample.distance = match distance {
                Distance::Value(v) => Distance::Value(round_to(v, DISTANCE_DIGITS)),
                Distance::Missing => Distance::Missing,
            };
        }

        let series = DistanceSeries {
            algorithm: name.to_string(),
            samples,
        };
        let missing = series.missing_count();
        if missing > 0 {
            log::warn!("⚠️  {}: {} of {} distances missing", name, missing, series.len());
        } else {
            log::info!("✅ {}: {} distances", name, series.len());
        }
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::test_graphs::graph_from_edges;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Replays a fixed list of scores, one per call
    struct Scripted {
        name: &'static str,
        scores: Vec<Result<f64, ()>>,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn new(name: &'static str, scores: Vec<Result<f64, ()>>) -> Self {
            Self {
                name,
                scores,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl GraphSimilarity for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        fn compare(&self, _a: &IntervalGraph, _b: &IntervalGraph) -> Result<f64, CompareError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.scores.get(call) {
                Some(Ok(v)) => Ok(*v),
                _ => Err(CompareError::Computation(format!("call {}", call))),
            }
        }
    }

    fn sequence(len: usize) -> Vec<IntervalGraph> {
        (0..len)
            .map(|i| {
                let mut g = graph_from_edges(&[("a", "b")]);
                g.interval_start = i as i64 * 300;
                g.interval_end = g.interval_start + 300;
                g
            })
            .collect()
    }

    fn values(series: &DistanceSeries) -> Vec<Option<f64>> {
        series.samples.iter().map(|s| s.distance.value()).collect()
    }

    #[test]
    fn test_normalization_scenario() {
        let algorithm = Scripted::new("S", vec![Ok(0.2), Ok(0.4), Ok(0.6), Ok(0.8)]);
        let comparator = GraphSequenceComparator::new(AlgorithmRegistry::new(), true);

        let series = comparator.compare_algorithm(&algorithm, &sequence(5));
        assert_eq!(
            values(&series),
            vec![Some(0.0), Some(0.33333), Some(0.66667), Some(1.0)]
        );
    }

    #[test]
    fn test_constant_series_normalizes_to_zero() {
        let algorithm = Scripted::new("S", vec![Ok(0.7); 3]);
        let comparator = GraphSequenceComparator::new(AlgorithmRegistry::new(), true);

        let series = comparator.compare_algorithm(&algorithm, &sequence(4));
        assert_eq!(values(&series), vec![Some(0.0); 3]);
    }

    #[test]
    fn test_raw_values_are_rounded_without_normalization() {
        let algorithm = Scripted::new("S", vec![Ok(0.123456789), Ok(2.0)]);
        let comparator = GraphSequenceComparator::new(AlgorithmRegistry::new(), false);

        let series = comparator.compare_algorithm(&algorithm, &sequence(3));
        assert_eq!(values(&series), vec![Some(0.12346), Some(2.0)]);
    }

    #[test]
    fn test_empty_pairs_short_circuit() {
        let algorithm = Scripted::new("S", vec![]);
        let calls = algorithm.calls.clone();
        let graphs = vec![
            IntervalGraph::empty(0, 300),
            IntervalGraph::empty(300, 600),
            IntervalGraph::empty(600, 900),
        ];
        let comparator = GraphSequenceComparator::new(AlgorithmRegistry::new(), false);

        let series = comparator.compare_algorithm(&algorithm, &graphs);
        assert_eq!(values(&series), vec![Some(0.0), Some(0.0)]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failures_are_isolated_and_aligned() {
        let flaky = Scripted::new("Flaky", vec![Ok(1.0), Err(()), Ok(f64::NAN), Ok(3.0)]);
        let registry = AlgorithmRegistry::new()
            .with(flaky)
            .with(Scripted::new("Steady", vec![Ok(0.5); 4]));
        let comparator = GraphSequenceComparator::new(registry, true);

        let all = comparator.compare(&sequence(5));
        assert_eq!(all.len(), 2);

        let flaky = &all[0];
        assert_eq!(values(flaky), vec![Some(0.0), None, None, Some(1.0)]);
        assert_eq!(flaky.missing_count(), 2);
        assert!(flaky.samples[2].failure.as_deref().unwrap_or("").contains("non-finite"));

        let steady = &all[1];
        assert_eq!(steady.len(), 4);
        assert_eq!(steady.missing_count(), 0);

        let ts = flaky.to_time_series();
        assert_eq!(ts.timestamps(), vec![600, 1500]);
    }

    #[test]
    fn test_round_to_ties_to_even() {
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(-2.5, 0), -2.0);
        assert_eq!(round_to(0.123456, 5), 0.12346);
    }

    #[test]
    fn test_sample_metadata_and_statistics() {
        let algorithm = Scripted::new("S", vec![Ok(0.1), Ok(0.2)]);
        let mut graphs = sequence(3);
        graphs[2] = graph_from_edges(&[("a", "b"), ("b", "c"), ("c", "d")]);
        graphs[2].interval_start = 600;
        graphs[2].interval_end = 900;

        let comparator = GraphSequenceComparator::new(AlgorithmRegistry::new(), false);
        let series = comparator.compare_algorithm(&algorithm, &graphs);

        let second = &series.samples[1];
        assert_eq!(second.from_interval, 300);
        assert_eq!(second.to_interval, 600);
        assert_eq!(second.timestamp, 900);
        assert_eq!((second.node_count_1, second.node_count_2), (2, 4));

        let stats = series.statistics();
        assert_eq!(stats.algorithm, "S");
        assert_eq!(stats.samples, 2);
        // g1 mean 2, g2 mean 3, the 2.5 tie rounds to even
        assert_eq!(stats.mean_node_size, 2);
        assert!(stats.mean_duration_secs >= 0.0);
    }

    #[test]
    fn test_short_sequences_yield_empty_series() {
        let comparator = GraphSequenceComparator::new(AlgorithmRegistry::with_defaults(), true);
        let all = comparator.compare(&sequence(1));
        assert_eq!(all.len(), 7);
        assert!(all.iter().all(|s| s.is_empty()));
        assert!(comparator.compare(&[]).iter().all(|s| s.is_empty()));
    }

    #[test]
    fn test_normalize_ignores_missing() {
        let mut values = vec![Distance::Value(2.0), Distance::Missing, Distance::Value(4.0)];
        normalize_min_max(&mut values);
        assert_eq!(values, vec![Distance::Value(0.0), Distance::Missing, Distance::Value(1.0)]);

        let mut none = vec![Distance::Missing];
        normalize_min_max(&mut none);
        assert_eq!(none, vec![Distance::Missing]);
    }
}
