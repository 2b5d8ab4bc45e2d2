//! Ingest - Event and Price Sources
//!
//! The engine only sees the two traits below. SQLite readers are the production
//! sources; the JSONL and in-memory sources serve local runs and tests.

pub mod sqlite_reader;

pub use sqlite_reader::{ReaderError, SqliteEventReader, SqlitePriceReader};

use crate::graph_core::{InteractionEvent, PartitionSize};
use crate::stats::TimeSeries;
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;

/// Interaction events for a half-open time range
pub trait EventSource {
    fn events_between(&self, start: i64, end: i64) -> Result<Vec<InteractionEvent>, ReaderError>;
}

/// Close-price series for a partition and half-open time range
pub trait PriceSource {
    fn prices_between(
        &self,
        partition: PartitionSize,
        start: i64,
        end: i64,
    ) -> Result<TimeSeries, ReaderError>;
}

/// `[Jan 1 of year, Jan 1 of year + 1)` in unix seconds, UTC
pub fn year_bounds(year: i32) -> Result<(i64, i64), ReaderError> {
    let start_of = |y: i32| {
        NaiveDate::from_ymd_opt(y, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
            .ok_or(ReaderError::InvalidYear(year))
    };
    Ok((start_of(year)?, start_of(year + 1)?))
}

/// Events held in memory, sorted by timestamp
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSource {
    events: Vec<InteractionEvent>,
}

impl MemoryEventSource {
    pub fn new(mut events: Vec<InteractionEvent>) -> Self {
        events.sort_by_key(|e| e.timestamp);
        Self { events }
    }

    /// Load one event per line; lines that fail to parse are skipped with a warning
    pub fn from_jsonl(path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let mut events = Vec::new();

        for (line_no, line) in std::io::BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match InteractionEvent::from_jsonl(&line) {
                Ok(event) => events.push(event),
                Err(e) => log::warn!("⚠️  {}:{}: {}", path.display(), line_no + 1, e),
            }
        }

        log::info!("📥 Loaded {} events from {}", events.len(), path.display());
        Ok(Self::new(events))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSource for MemoryEventSource {
    fn events_between(&self, start: i64, end: i64) -> Result<Vec<InteractionEvent>, ReaderError> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp < end)
            .cloned()
            .collect())
    }
}

/// Close prices held in memory per partition
#[derive(Debug, Clone, Default)]
pub struct MemoryPriceSource {
    prices: BTreeMap<PartitionSize, Vec<(i64, f64)>>,
}

impl MemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prices(mut self, partition: PartitionSize, points: Vec<(i64, f64)>) -> Self {
        self.prices.entry(partition).or_default().extend(points);
        self
    }
}

impl PriceSource for MemoryPriceSource {
    fn prices_between(
        &self,
        partition: PartitionSize,
        start: i64,
        end: i64,
    ) -> Result<TimeSeries, ReaderError> {
        let points = self
            .prices
            .get(&partition)
            .map(|points| {
                points
                    .iter()
                    .filter(|(ts, _)| *ts >= start && *ts < end)
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        Ok(TimeSeries::from_unordered("close", points))
    }
}
