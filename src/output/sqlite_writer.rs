//! SQLite writer for analysis results with batched transactional inserts

use super::rows::{CausalityRow, DistanceRow, MergedRow, RunKey, StatisticsRow};
use super::writer_backend::{ResultRecord, ResultWriterBackend, ResultWriterError};
use crate::sqlite_pragma::apply_optimized_pragmas;
use async_trait::async_trait;
use rusqlite::{params, Connection, Transaction};
use std::path::Path;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS distance_samples (
        algorithm TEXT NOT NULL,
        year INTEGER NOT NULL,
        partition TEXT NOT NULL,
        g1_interval TEXT NOT NULL,
        g2_interval TEXT NOT NULL,
        date_time TEXT NOT NULL,
        g1_node_size INTEGER NOT NULL,
        g2_node_size INTEGER NOT NULL,
        duration REAL NOT NULL,
        distance REAL,
        PRIMARY KEY (algorithm, year, partition, date_time)
    );

    CREATE TABLE IF NOT EXISTS comparison_statistics (
        algorithm TEXT NOT NULL,
        year INTEGER NOT NULL,
        partition TEXT NOT NULL,
        mean_duration_secs REAL NOT NULL,
        mean_node_size INTEGER NOT NULL,
        samples INTEGER NOT NULL,
        missing INTEGER NOT NULL,
        PRIMARY KEY (algorithm, year, partition)
    );

    CREATE TABLE IF NOT EXISTS merged_series (
        algorithm TEXT NOT NULL,
        year INTEGER NOT NULL,
        partition TEXT NOT NULL,
        date_time TEXT NOT NULL,
        close REAL NOT NULL,
        distance REAL NOT NULL,
        PRIMARY KEY (algorithm, year, partition, date_time)
    );

    CREATE TABLE IF NOT EXISTS causality_results (
        algorithm TEXT NOT NULL,
        hypothesis TEXT NOT NULL,
        year INTEGER NOT NULL,
        partition TEXT NOT NULL,
        lags_p_values TEXT NOT NULL,
        adf_dist_p_values TEXT NOT NULL,
        adf_dist_diff_order INTEGER NOT NULL,
        adf_price_p_values TEXT NOT NULL,
        adf_price_diff_order INTEGER NOT NULL,
        status TEXT NOT NULL,
        detail TEXT,
        PRIMARY KEY (algorithm, hypothesis, year, partition)
    );
";

pub struct SqliteResultWriter {
    conn: Connection,
    batch: Vec<ResultRecord>,
    batch_size: usize,
}

impl SqliteResultWriter {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, ResultWriterError> {
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ResultWriterError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to create database directory {}: {}", parent.display(), e),
                ))
            })?;
        }

        let conn = Connection::open(db_path)?;
        apply_optimized_pragmas(&conn)?;
        conn.execute_batch(SCHEMA)?;

        log::info!("✅ SQLite result database initialized with WAL mode");

        Ok(Self {
            conn,
            batch: Vec::with_capacity(500),
            batch_size: 500,
        })
    }

    fn flush_batch(&mut self) -> Result<(), ResultWriterError> {
        if self.batch.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        for record in &self.batch {
            match record {
                ResultRecord::Distance(row) => insert_distance(&tx, row)?,
                ResultRecord::Statistics(row) => insert_statistics(&tx, row)?,
                ResultRecord::Merged(row) => insert_merged(&tx, row)?,
                ResultRecord::Causality(row) => insert_causality(&tx, row)?,
            }
        }
        tx.commit()?;

        log::debug!("✅ Flushed {} result rows to SQLite", self.batch.len());
        self.batch.clear();
        Ok(())
    }
}

fn insert_distance(tx: &Transaction, row: &DistanceRow) -> Result<(), ResultWriterError> {
    tx.execute(
        "INSERT OR REPLACE INTO distance_samples
         (algorithm, year, partition, g1_interval, g2_interval, date_time,
          g1_node_size, g2_node_size, duration, distance)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            row.algorithm,
            row.year,
            row.partition,
            row.g1_interval,
            row.g2_interval,
            row.date_time,
            row.g1_node_size as i64,
            row.g2_node_size as i64,
            row.duration,
            row.distance,
        ],
    )?;
    Ok(())
}

fn insert_statistics(tx: &Transaction, row: &StatisticsRow) -> Result<(), ResultWriterError> {
    tx.execute(
        "INSERT OR REPLACE INTO comparison_statistics
         (algorithm, year, partition, mean_duration_secs, mean_node_size, samples, missing)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            row.algorithm,
            row.year,
            row.partition,
            row.mean_duration_secs,
            row.mean_node_size as i64,
            row.samples as i64,
            row.missing as i64,
        ],
    )?;
    Ok(())
}

fn insert_merged(tx: &Transaction, row: &MergedRow) -> Result<(), ResultWriterError> {
    tx.execute(
        "INSERT OR REPLACE INTO merged_series
         (algorithm, year, partition, date_time, close, distance)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            row.algorithm,
            row.year,
            row.partition,
            row.date_time,
            row.close,
            row.distance,
        ],
    )?;
    Ok(())
}

fn insert_causality(tx: &Transaction, row: &CausalityRow) -> Result<(), ResultWriterError> {
    tx.execute(
        "INSERT OR REPLACE INTO causality_results
         (algorithm, hypothesis, year, partition, lags_p_values,
          adf_dist_p_values, adf_dist_diff_order, adf_price_p_values, adf_price_diff_order,
          status, detail)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            row.algorithm,
            row.hypothesis.as_str(),
            row.year,
            row.partition,
            row.lags_p_values,
            serde_json::to_string(&row.adf_dist_p_values)?,
            row.adf_dist_diff_order as i64,
            serde_json::to_string(&row.adf_price_p_values)?,
            row.adf_price_diff_order as i64,
            row.status.as_str(),
            row.detail,
        ],
    )?;
    Ok(())
}

#[async_trait]
impl ResultWriterBackend for SqliteResultWriter {
    async fn write(&mut self, _key: RunKey, record: &ResultRecord) -> Result<(), ResultWriterError> {
        self.batch.push(record.clone());
        if self.batch.len() >= self.batch_size {
            self.flush_batch()?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ResultWriterError> {
        self.flush_batch()
    }

    fn backend_type(&self) -> &'static str {
        "SQLite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_core::PartitionSize;
    use crate::output::rows::{CausalityStatus, Hypothesis};
    use tempfile::tempdir;

    fn key() -> RunKey {
        RunKey::new(2018, PartitionSize::Min5)
    }

    fn count(conn: &Connection, sql: &str) -> i64 {
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    fn create_test_distance(i: usize, distance: Option<f64>) -> ResultRecord {
        ResultRecord::Distance(DistanceRow {
            algorithm: "MCS".to_string(),
            year: 2018,
            partition: "5m".to_string(),
            g1_interval: format!("2018-01-01 {:02}:{:02}:00", i / 60, i % 60),
            g2_interval: format!("2018-01-01 {:02}:{:02}:05", i / 60, i % 60),
            date_time: format!("2018-01-01 {:02}:{:02}:10", i / 60, i % 60),
            g1_node_size: 4,
            g2_node_size: 6,
            duration: 0.0001,
            distance,
        })
    }

    fn create_test_causality(hypothesis: Hypothesis, summary: &str) -> ResultRecord {
        ResultRecord::Causality(CausalityRow {
            algorithm: "BagOfNodes".to_string(),
            hypothesis,
            year: 2018,
            partition: "5m".to_string(),
            lags_p_values: summary.to_string(),
            adf_dist_p_values: vec![0.3, 0.001],
            adf_dist_diff_order: 1,
            adf_price_p_values: vec![0.9, 0.0],
            adf_price_diff_order: 1,
            status: CausalityStatus::Ok,
            detail: None,
        })
    }

    #[tokio::test]
    async fn test_batch_flush_and_nullable_distance() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("results.db");
        let mut writer = SqliteResultWriter::new(&db_path).unwrap();

        // 600 rows trigger one auto-flush at 500
        for i in 0..600 {
            let distance = if i == 7 { None } else { Some(0.5) };
            writer.write(key(), &create_test_distance(i, distance)).await.unwrap();
        }
        writer.flush().await.unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM distance_samples", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 600);

        let nulls: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM distance_samples WHERE distance IS NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(nulls, 1);
    }

    #[tokio::test]
    async fn test_rerun_replaces_distance_rows() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("results.db");
        let mut writer = SqliteResultWriter::new(&db_path).unwrap();

        for i in 0..10 {
            writer.write(key(), &create_test_distance(i, Some(0.5))).await.unwrap();
        }
        writer.flush().await.unwrap();
        for i in 0..10 {
            writer.write(key(), &create_test_distance(i, Some(0.25))).await.unwrap();
        }
        writer.flush().await.unwrap();

        let conn = Connection::open(&db_path).unwrap();
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM distance_samples"), 10);
        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM distance_samples WHERE distance = 0.25"),
            10
        );
    }

    #[tokio::test]
    async fn test_causality_rows_replace_per_hypothesis() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("results.db");
        let mut writer = SqliteResultWriter::new(&db_path).unwrap();

        writer.write(key(), &create_test_causality(Hypothesis::H0, "1 (0.5000)")).await.unwrap();
        writer.write(key(), &create_test_causality(Hypothesis::HA, "1 (0.0100)")).await.unwrap();
        writer.write(key(), &create_test_causality(Hypothesis::H0, "1 (0.2500)")).await.unwrap();
        writer.flush().await.unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let (summary, p_values): (String, String) = conn
            .query_row(
                "SELECT lags_p_values, adf_price_p_values FROM causality_results WHERE hypothesis = 'H0'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(summary, "1 (0.2500)");
        let parsed: Vec<f64> = serde_json::from_str(&p_values).unwrap();
        assert_eq!(parsed, vec![0.9, 0.0]);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM causality_results", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_wal_mode_enabled() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("results.db");
        let _writer = SqliteResultWriter::new(&db_path).unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(journal_mode.to_lowercase(), "wal");
    }
}
