//! Flat result rows shared by the JSONL and SQLite writers

use crate::compare::{ComparisonStatistics, DistanceSample};
use crate::graph_core::PartitionSize;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sentinel summary when either series never became stationary
pub const NOT_STATIONARY: &str = "Not Stationary Data";
/// Sentinel summary when the test could not run
pub const ERROR_ENCOUNTERED: &str = "Error encountered";

/// Unix seconds as `YYYY-MM-DD HH:MM:SS` (UTC)
pub fn format_timestamp(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.format(DATETIME_FORMAT).to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Which unit of work a row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunKey {
    pub year: i32,
    pub partition: PartitionSize,
}

impl RunKey {
    pub fn new(year: i32, partition: PartitionSize) -> Self {
        Self { year, partition }
    }
}

impl std::fmt::Display for RunKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.year, self.partition.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceRow {
    pub algorithm: String,
    pub year: i32,
    pub partition: String,
    pub g1_interval: String,
    pub g2_interval: String,
    pub date_time: String,
    pub g1_node_size: usize,
    pub g2_node_size: usize,
    pub duration: f64,
    /// `None` when the algorithm failed on this pair
    pub distance: Option<f64>,
}

impl DistanceRow {
    pub fn from_sample(key: RunKey, algorithm: &str, sample: &DistanceSample) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            year: key.year,
            partition: key.partition.as_str().to_string(),
            g1_interval: format_timestamp(sample.from_interval),
            g2_interval: format_timestamp(sample.to_interval),
            date_time: format_timestamp(sample.timestamp),
            g1_node_size: sample.node_count_1,
            g2_node_size: sample.node_count_2,
            duration: sample.duration,
            distance: sample.distance.value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsRow {
    pub algorithm: String,
    pub year: i32,
    pub partition: String,
    pub mean_duration_secs: f64,
    pub mean_node_size: u64,
    pub samples: usize,
    pub missing: usize,
}

impl StatisticsRow {
    pub fn from_statistics(key: RunKey, stats: &ComparisonStatistics) -> Self {
        Self {
            algorithm: stats.algorithm.clone(),
            year: key.year,
            partition: key.partition.as_str().to_string(),
            mean_duration_secs: stats.mean_duration_secs,
            mean_node_size: stats.mean_node_size,
            samples: stats.samples,
            missing: stats.missing,
        }
    }
}

/// One timestamp of the price/distance inner join
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRow {
    pub algorithm: String,
    pub year: i32,
    pub partition: String,
    pub date_time: String,
    pub close: f64,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Hypothesis {
    /// Distance Granger-causes price
    H0,
    /// Price Granger-causes distance
    HA,
}

impl Hypothesis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hypothesis::H0 => "H0",
            Hypothesis::HA => "HA",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CausalityStatus {
    Ok,
    NotStationary,
    InsufficientData,
    Failed,
}

impl CausalityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CausalityStatus::Ok => "ok",
            CausalityStatus::NotStationary => "not_stationary",
            CausalityStatus::InsufficientData => "insufficient_data",
            CausalityStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CausalityRow {
    pub algorithm: String,
    pub hypothesis: Hypothesis,
    pub year: i32,
    pub partition: String,
    /// `"1 (0.1234), 2 (0.0456)"` or a sentinel
    pub lags_p_values: String,
    pub adf_dist_p_values: Vec<f64>,
    pub adf_dist_diff_order: usize,
    pub adf_price_p_values: Vec<f64>,
    pub adf_price_diff_order: usize,
    pub status: CausalityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
