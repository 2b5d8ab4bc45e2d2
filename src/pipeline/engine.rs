//! Analysis Engine - orchestration over years × partitions
//!
//! Each `(year, partition)` pair is an independent unit of work:
//!
//! ```text
//! EventSource ──> TemporalGraphBuilder ──> GraphSequenceComparator ──> distances, statistics
//!                                                   │
//! PriceSource ──> close series ──inner join──> merged rows
//!                                                   │
//!                 StationarityResolver (price, then distance) ──> CausalityTester ×2 (H0, HA)
//! ```
//!
//! A failing unit is logged and recorded in the [`RunReport`]; the remaining units still
//! run. Inside a unit, a failing causality step becomes a sentinel row for that algorithm.

use super::config::{ConfigError, PipelineConfig};
use crate::compare::{AlgorithmRegistry, CompareError, DistanceSeries, GraphSequenceComparator};
use crate::graph_core::{InteractionEvent, PartitionSize, TemporalGraphBuilder};
use crate::ingest::{year_bounds, EventSource, PriceSource, ReaderError};
use crate::output::{
    format_timestamp, CausalityRow, CausalityStatus, DistanceRow, Hypothesis, MergedRow,
    ResultRecord, ResultWriter, ResultWriterError, RunKey, StatisticsRow, ERROR_ENCOUNTERED,
    NOT_STATIONARY,
};
use crate::stats::{
    AdfTest, CausalityError, CausalityTester, StationarityOutcome, StationarityResolver,
    TimeSeries, Verdict,
};

/// Digits kept for ADF p-values in result rows
const ADF_P_DIGITS: i32 = 4;

#[derive(Debug)]
pub enum EngineError {
    Reader(ReaderError),
    Writer(ResultWriterError),
    Config(ConfigError),
    Compare(CompareError),
}

impl From<ReaderError> for EngineError {
    fn from(err: ReaderError) -> Self {
        EngineError::Reader(err)
    }
}

impl From<ResultWriterError> for EngineError {
    fn from(err: ResultWriterError) -> Self {
        EngineError::Writer(err)
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::Config(err)
    }
}

impl From<CompareError> for EngineError {
    fn from(err: CompareError) -> Self {
        EngineError::Compare(err)
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Reader(e) => write!(f, "Reader error: {}", e),
            EngineError::Writer(e) => write!(f, "Writer error: {}", e),
            EngineError::Config(e) => write!(f, "Config error: {}", e),
            EngineError::Compare(e) => write!(f, "Compare error: {}", e),
        }
    }
}

impl std::error::Error for EngineError {}

/// What one successful unit produced
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSummary {
    pub key: RunKey,
    pub graphs: usize,
    pub non_empty_graphs: usize,
    pub skipped_events: usize,
    pub algorithms: usize,
    pub missing_distances: usize,
    pub merged_points: usize,
    /// Causality rows by status, in `[ok, not_stationary, insufficient_data, failed]` order
    pub causality_status_counts: [usize; 4],
    pub rows_written: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitFailure {
    pub key: RunKey,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub units: Vec<UnitSummary>,
    pub failures: Vec<UnitFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Rows produced for one algorithm inside a unit
struct AlgorithmRows {
    records: Vec<ResultRecord>,
    merged_points: usize,
    statuses: Vec<CausalityStatus>,
}

pub struct AnalysisEngine<E: EventSource, P: PriceSource> {
    events: E,
    prices: P,
    builder: TemporalGraphBuilder,
    comparator: GraphSequenceComparator,
    resolver: StationarityResolver,
    tester: CausalityTester,
    years: Vec<i32>,
    partitions: Vec<PartitionSize>,
}

impl<E: EventSource, P: PriceSource> AnalysisEngine<E, P> {
    /// Engine with every default: all algorithms, all partitions, years 2018 and 2022
    pub fn new(events: E, prices: P) -> Self {
        let defaults = PipelineConfig::default();
        Self {
            events,
            prices,
            builder: TemporalGraphBuilder::with_defaults(),
            comparator: GraphSequenceComparator::new(AlgorithmRegistry::with_defaults(), defaults.normalize),
            resolver: StationarityResolver::default(),
            tester: CausalityTester::default(),
            years: defaults.years,
            partitions: defaults.partitions,
        }
    }

    /// Engine wired from a validated configuration
    pub fn from_config(config: &PipelineConfig, events: E, prices: P) -> Result<Self, EngineError> {
        config.validate()?;

        let registry = match &config.algorithms {
            Some(names) => AlgorithmRegistry::with_defaults().select(names)?,
            None => AlgorithmRegistry::with_defaults(),
        };

        Ok(Self {
            events,
            prices,
            builder: TemporalGraphBuilder::new(&config.excluded_tags),
            comparator: GraphSequenceComparator::new(registry, config.normalize),
            resolver: StationarityResolver::new(
                config.max_diff_order,
                config.significance,
                AdfTest::new(config.max_lag),
            ),
            tester: CausalityTester::new(config.max_lag),
            years: config.years.clone(),
            partitions: config.partitions.clone(),
        })
    }

    pub fn with_years(mut self, years: Vec<i32>) -> Self {
        self.years = years;
        self
    }

    pub fn with_partitions(mut self, partitions: Vec<PartitionSize>) -> Self {
        self.partitions = partitions;
        self
    }

    pub fn with_comparator(mut self, comparator: GraphSequenceComparator) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn with_resolver(mut self, resolver: StationarityResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_tester(mut self, tester: CausalityTester) -> Self {
        self.tester = tester;
        self
    }

    /// Run every `(year, partition)` unit, writing rows as each unit completes
    pub async fn run(&self, writer: &mut ResultWriter) -> RunReport {
        let mut report = RunReport::default();
        log::info!(
            "🚀 Analysis run: {} years × {} partitions, algorithms: {:?}, backend: {}",
            self.years.len(),
            self.partitions.len(),
            self.comparator.registry().names(),
            writer.backend_type()
        );

        for &year in &self.years {
            let events = match self.load_year(year) {
                Ok(events) => events,
                Err(e) => {
                    log::error!("❌ Failed to load events for {}: {}", year, e);
                    for &partition in &self.partitions {
                        report.failures.push(UnitFailure {
                            key: RunKey::new(year, partition),
                            error: e.to_string(),
                        });
                    }
                    continue;
                }
            };

            for &partition in &self.partitions {
                let key = RunKey::new(year, partition);
                match self.run_unit(key, &events, writer).await {
                    Ok(summary) => {
                        log::info!(
                            "✅ {}: {} graphs, {} rows written",
                            key,
                            summary.graphs,
                            summary.rows_written
                        );
                        report.units.push(summary);
                    }
                    Err(e) => {
                        log::error!("❌ Unit {} failed: {}", key, e);
                        report.failures.push(UnitFailure {
                            key,
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        if let Err(e) = writer.flush().await {
            log::error!("❌ Final flush failed: {}", e);
        }

        log::info!(
            "🏁 Run finished: {} units ok, {} failed",
            report.units.len(),
            report.failures.len()
        );
        report
    }

    fn load_year(&self, year: i32) -> Result<Vec<InteractionEvent>, EngineError> {
        let (start, end) = year_bounds(year)?;
        let events = self.events.events_between(start, end)?;
        log::info!("📥 {}: {} events", year, events.len());
        Ok(events)
    }

    /// Build, compare, persist and test one `(year, partition)` unit
    pub async fn run_unit(
        &self,
        key: RunKey,
        events: &[InteractionEvent],
        writer: &mut ResultWriter,
    ) -> Result<UnitSummary, EngineError> {
        log::info!("############## {} ##############", key);

        let sequence = self.builder.build(events, key.partition);
        let series = self.comparator.compare(&sequence.graphs);

        let mut records = Vec::new();
        for s in &series {
            records.extend(
                s.samples
                    .iter()
                    .map(|sample| ResultRecord::Distance(DistanceRow::from_sample(key, &s.algorithm, sample))),
            );
            records.push(ResultRecord::Statistics(StatisticsRow::from_statistics(
                key,
                &s.statistics(),
            )));
        }

        let (start, end) = year_bounds(key.year)?;
        let prices = self.prices.prices_between(key.partition, start, end)?;
        log::info!("💰 {}: {} close prices", key, prices.len());

        let mut merged_points = 0;
        let mut causality_status_counts = [0usize; 4];
        for s in &series {
            let rows = self.analyze_algorithm(key, &prices, s);
            merged_points += rows.merged_points;
            for status in rows.statuses {
                causality_status_counts[status_index(status)] += 1;
            }
            records.extend(rows.records);
        }

        let rows_written = writer.write_all(key, records).await?;
        writer.flush().await?;

        Ok(UnitSummary {
            key,
            graphs: sequence.graphs.len(),
            non_empty_graphs: sequence.non_empty_count(),
            skipped_events: sequence.skipped.len(),
            algorithms: series.len(),
            missing_distances: series.iter().map(DistanceSeries::missing_count).sum(),
            merged_points,
            causality_status_counts,
            rows_written,
        })
    }

    /// Merge one distance series with the price series and test both hypotheses
    fn analyze_algorithm(&self, key: RunKey, prices: &TimeSeries, series: &DistanceSeries) -> AlgorithmRows {
        let distances = series.to_time_series();
        let (price, distance) = prices.inner_join(&distances);

        let mut records: Vec<ResultRecord> = price
            .points()
            .iter()
            .zip(distance.points())
            .map(|((ts, close), (_, d))| {
                ResultRecord::Merged(MergedRow {
                    algorithm: series.algorithm.clone(),
                    year: key.year,
                    partition: key.partition.as_str().to_string(),
                    date_time: format_timestamp(*ts),
                    close: *close,
                    distance: *d,
                })
            })
            .collect();
        let merged_points = price.len();

        let causality = self.causality_rows(key, &series.algorithm, &price, &distance);
        let statuses = causality.iter().map(|row| row.status).collect();
        records.extend(causality.into_iter().map(ResultRecord::Causality));

        AlgorithmRows {
            records,
            merged_points,
            statuses,
        }
    }

    /// H0 (distance → price) and HA (price → distance) rows for one algorithm
    ///
    /// The price is resolved first; the distance is trimmed to the surviving price
    /// timestamps, resolved, and both are realigned before testing.
    pub fn causality_rows(
        &self,
        key: RunKey,
        algorithm: &str,
        price: &TimeSeries,
        distance: &TimeSeries,
    ) -> Vec<CausalityRow> {
        let price_outcome = self.resolver.resolve(price);
        let (_, distance_trimmed) = price_outcome.series.inner_join(distance);
        let distance_outcome = self.resolver.resolve(&distance_trimmed);

        let row = |hypothesis: Hypothesis, summary: String, status: CausalityStatus, detail: Option<String>| {
            CausalityRow {
                algorithm: algorithm.to_string(),
                hypothesis,
                year: key.year,
                partition: key.partition.as_str().to_string(),
                lags_p_values: summary,
                adf_dist_p_values: rounded(&distance_outcome.p_values),
                adf_dist_diff_order: distance_outcome.order,
                adf_price_p_values: rounded(&price_outcome.p_values),
                adf_price_diff_order: price_outcome.order,
                status,
                detail,
            }
        };

        if !price_outcome.is_stationary() || !distance_outcome.is_stationary() {
            let insufficient = price_outcome.verdict == Verdict::InsufficientData
                || distance_outcome.verdict == Verdict::InsufficientData;
            let (summary, status) = if insufficient {
                (ERROR_ENCOUNTERED, CausalityStatus::InsufficientData)
            } else {
                (NOT_STATIONARY, CausalityStatus::NotStationary)
            };
            let detail = format!(
                "price {} at order {}, distance {} at order {}",
                price_outcome.verdict.as_str(),
                price_outcome.order,
                distance_outcome.verdict.as_str(),
                distance_outcome.order
            );
            log::info!("⏭️  {} {}: causality skipped ({})", key, algorithm, detail);
            return [Hypothesis::H0, Hypothesis::HA]
                .into_iter()
                .map(|h| row(h, summary.to_string(), status, Some(detail.clone())))
                .collect();
        }

        let (price_aligned, distance_aligned) = price_outcome.series.inner_join(&distance_outcome.series);
        let price_ready = with_series(&price_outcome, price_aligned);
        let distance_ready = with_series(&distance_outcome, distance_aligned);

        [
            (Hypothesis::H0, &price_ready, &distance_ready),
            (Hypothesis::HA, &distance_ready, &price_ready),
        ]
        .into_iter()
        .map(|(hypothesis, effect, cause)| match self.tester.test(effect, cause) {
            Ok(result) => row(hypothesis, result.summary(), CausalityStatus::Ok, None),
            Err(e) => {
                log::warn!("⚠️  {} {} {}: {}", key, algorithm, hypothesis.as_str(), e);
                let status = match e {
                    CausalityError::InsufficientObservations { .. } => CausalityStatus::InsufficientData,
                    _ => CausalityStatus::Failed,
                };
                row(hypothesis, ERROR_ENCOUNTERED.to_string(), status, Some(e.to_string()))
            }
        })
        .collect()
    }
}

fn with_series(outcome: &StationarityOutcome, series: TimeSeries) -> StationarityOutcome {
    StationarityOutcome {
        verdict: outcome.verdict,
        series,
        order: outcome.order,
        p_values: outcome.p_values.clone(),
    }
}

fn rounded(p_values: &[f64]) -> Vec<f64> {
    p_values
        .iter()
        .map(|p| crate::compare::round_to(*p, ADF_P_DIGITS))
        .collect()
}

fn status_index(status: CausalityStatus) -> usize {
    match status {
        CausalityStatus::Ok => 0,
        CausalityStatus::NotStationary => 1,
        CausalityStatus::InsufficientData => 2,
        CausalityStatus::Failed => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{MemoryEventSource, MemoryPriceSource};

    fn key() -> RunKey {
        RunKey::new(2018, PartitionSize::Min5)
    }

    fn engine() -> AnalysisEngine<MemoryEventSource, MemoryPriceSource> {
        AnalysisEngine::new(MemoryEventSource::default(), MemoryPriceSource::new())
    }

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 11) as f64 / (1u64 << 53) as f64) - 0.5
            })
            .collect()
    }

    fn series(name: &str, values: &[f64]) -> TimeSeries {
        TimeSeries::new(
            name,
            values.iter().enumerate().map(|(i, v)| (i as i64 * 300, *v)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_causality_rows_for_stationary_inputs() {
        let price = series("close", &noise(80, 1));
        let distance = series("MCS", &noise(80, 2));

        let rows = engine().causality_rows(key(), "MCS", &price, &distance);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].hypothesis, Hypothesis::H0);
        assert_eq!(rows[1].hypothesis, Hypothesis::HA);
        for row in &rows {
            assert_eq!(row.status, CausalityStatus::Ok);
            assert!(row.lags_p_values.starts_with("1 ("));
            assert_eq!(row.lags_p_values.matches(", ").count(), 4);
            assert_eq!(row.adf_price_diff_order, 0);
            assert_eq!(row.adf_price_p_values.len(), 1);
        }
    }

    #[test]
    fn test_non_stationary_inputs_yield_sentinels() {
        // quadratic trend never resolves within order 1
        let quadratic: Vec<f64> = (0..80).map(|v| (v * v) as f64).collect();
        let engine = engine().with_resolver(StationarityResolver {
            max_order: 1,
            ..Default::default()
        });

        let rows = engine.causality_rows(
            key(),
            "Jaccard",
            &series("close", &quadratic),
            &series("Jaccard", &noise(80, 3)),
        );
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.status, CausalityStatus::NotStationary);
            assert_eq!(row.lags_p_values, NOT_STATIONARY);
            assert_eq!(row.adf_price_diff_order, 1);
            assert_eq!(row.adf_price_p_values.len(), 2);
        }
    }

    #[test]
    fn test_short_inputs_yield_insufficient_data() {
        let rows = engine().causality_rows(
            key(),
            "MCS",
            &series("close", &noise(8, 1)),
            &series("MCS", &noise(8, 2)),
        );
        assert!(rows
            .iter()
            .all(|r| r.status == CausalityStatus::InsufficientData && r.lags_p_values == ERROR_ENCOUNTERED));
    }

    #[test]
    fn test_from_config_rejects_unknown_algorithm() {
        let config = PipelineConfig {
            algorithms: Some(vec!["GraphEditDistance".to_string()]),
            ..Default::default()
        };
        let result = AnalysisEngine::from_config(&config, MemoryEventSource::default(), MemoryPriceSource::new());
        assert!(matches!(result, Err(EngineError::Compare(CompareError::UnknownAlgorithm(_)))));
    }
}
