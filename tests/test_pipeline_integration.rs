//! Integration tests for the batch pipeline
//!
//! Tests drive `AnalysisEngine` end to end with in-memory sources and verify the
//! rows each output backend receives:
//! - One distance row per consecutive graph pair and algorithm
//! - One statistics row per algorithm
//! - Two causality rows (H0, HA) per algorithm, sentinel or not
//! - Units without data still complete

#[cfg(test)]
mod pipeline_integration_tests {
    use rusqlite::Connection;
    use socialflow::graph_core::{InteractionEvent, PartitionSize};
    use socialflow::ingest::{MemoryEventSource, MemoryPriceSource};
    use socialflow::output::ResultWriter;
    use socialflow::pipeline::{AnalysisEngine, BackendType};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    /// 2018-01-01 00:00:00 UTC
    const YEAR_START: i64 = 1_514_764_800;
    const STEP: i64 = 300;
    const INTERVALS: i64 = 60;

    fn events() -> Vec<InteractionEvent> {
        (0..INTERVALS)
            .flat_map(|i| {
                let base = YEAR_START + i * STEP;
                (0..(i % 4 + 1)).map(move |j| {
                    InteractionEvent::new(base + 10 + j, format!("user{}", (i + j) % 7))
                        .with_mention(format!("user{}", (i * 3 + j) % 11))
                        .with_tag(format!("topic{}", (i + j) % 5))
                })
            })
            .collect()
    }

    fn prices() -> Vec<(i64, f64)> {
        let mut state: u64 = 7;
        (0..=INTERVALS + 1)
            .map(|i| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let shock = ((state >> 11) as f64 / (1u64 << 53) as f64) - 0.5;
                (YEAR_START + i * STEP, 13_000.0 + 50.0 * shock)
            })
            .collect()
    }

    fn engine() -> AnalysisEngine<MemoryEventSource, MemoryPriceSource> {
        AnalysisEngine::new(
            MemoryEventSource::new(events()),
            MemoryPriceSource::new().with_prices(PartitionSize::Min5, prices()),
        )
        .with_years(vec![2018])
        .with_partitions(vec![PartitionSize::Min5])
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_jsonl_run_writes_every_table() {
        let dir = tempdir().unwrap();
        let mut writer = ResultWriter::new(BackendType::Jsonl, dir.path().to_path_buf()).unwrap();

        let report = engine().run(&mut writer).await;
        assert!(report.is_success(), "failures: {:?}", report.failures);
        assert_eq!(report.units.len(), 1);

        let unit = &report.units[0];
        assert_eq!(unit.graphs, INTERVALS as usize);
        assert_eq!(unit.algorithms, 7);
        assert_eq!(unit.causality_status_counts.iter().sum::<usize>(), 14);

        let unit_dir = dir.path().join("2018").join("5m");
        let distances = read_lines(&unit_dir.join("distances.jsonl"));
        assert_eq!(distances.len(), 7 * (INTERVALS as usize - 1));

        let statistics = read_lines(&unit_dir.join("statistics.jsonl"));
        assert_eq!(statistics.len(), 7);

        let merged = read_lines(&unit_dir.join("merged.jsonl"));
        assert_eq!(merged.len(), unit.merged_points);
        assert!(merged.iter().all(|row| row["close"].as_f64().is_some()));

        let causality = read_lines(&unit_dir.join("causality.jsonl"));
        assert_eq!(causality.len(), 14);
        for row in &causality {
            let summary = row["lags_p_values"].as_str().unwrap();
            match row["status"].as_str().unwrap() {
                "ok" => assert!(summary.starts_with("1 (")),
                "not_stationary" => assert_eq!(summary, "Not Stationary Data"),
                _ => assert_eq!(summary, "Error encountered"),
            }
        }
    }

    #[tokio::test]
    async fn test_sqlite_run_persists_causality_pairs() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("results.db");
        let mut writer = ResultWriter::new(BackendType::Sqlite, db_path.clone()).unwrap();

        let report = engine().run(&mut writer).await;
        assert!(report.is_success());
        drop(writer);

        let conn = Connection::open(&db_path).unwrap();
        let pairs: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM causality_results WHERE year = 2018 AND partition = '5m'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(pairs, 14);

        let statistics: i64 = conn
            .query_row("SELECT COUNT(*) FROM comparison_statistics", [], |row| row.get(0))
            .unwrap();
        assert_eq!(statistics, 7);
    }

    #[tokio::test]
    async fn test_empty_year_completes_with_insufficient_data() {
        let dir = tempdir().unwrap();
        let mut writer = ResultWriter::new(BackendType::Jsonl, dir.path().to_path_buf()).unwrap();

        let report = engine().with_years(vec![2022]).run(&mut writer).await;
        assert!(report.is_success());

        let unit = &report.units[0];
        assert_eq!(unit.graphs, 0);
        assert_eq!(unit.merged_points, 0);
        // [ok, not_stationary, insufficient_data, failed]
        assert_eq!(unit.causality_status_counts, [0, 0, 14, 0]);
    }
}
