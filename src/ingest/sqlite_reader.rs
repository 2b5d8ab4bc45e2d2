//! SQLite readers for interaction events and close prices
//!
//! Both readers open the database read-only. Event rows store mentions, tags and links
//! as JSON arrays; a row whose arrays do not parse is skipped with a warning.

use super::{EventSource, PriceSource};
use crate::graph_core::{InteractionEvent, PartitionSize};
use crate::sqlite_pragma::apply_optimized_pragmas;
use crate::stats::TimeSeries;
use rusqlite::{params, Connection};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug)]
pub enum ReaderError {
    Database(rusqlite::Error),
    Io(std::io::Error),
    InvalidYear(i32),
}

impl From<rusqlite::Error> for ReaderError {
    fn from(err: rusqlite::Error) -> Self {
        ReaderError::Database(err)
    }
}

impl From<std::io::Error> for ReaderError {
    fn from(err: std::io::Error) -> Self {
        ReaderError::Io(err)
    }
}

impl std::fmt::Display for ReaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReaderError::Database(e) => write!(f, "Database error: {}", e),
            ReaderError::Io(e) => write!(f, "IO error: {}", e),
            ReaderError::InvalidYear(y) => write!(f, "Invalid year: {}", y),
        }
    }
}

impl std::error::Error for ReaderError {}

/// Open `db_path` with the shared PRAGMAs and writes disabled
fn open_read_only(db_path: &Path) -> Result<Connection, ReaderError> {
    let conn = Connection::open(db_path)?;
    apply_optimized_pragmas(&conn).map_err(ReaderError::Database)?;
    // must come after the PRAGMAs
    conn.execute_batch("PRAGMA query_only = ON")?;
    Ok(conn)
}

fn parse_json_set(raw: Option<String>) -> Result<BTreeSet<String>, serde_json::Error> {
    match raw {
        Some(text) if !text.trim().is_empty() => serde_json::from_str(&text),
        _ => Ok(BTreeSet::new()),
    }
}

/// Reads `events(id, timestamp, actor_id, mentions, tags, links)`
pub struct SqliteEventReader {
    conn: Connection,
}

impl SqliteEventReader {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let db_path = db_path.as_ref();
        let conn = open_read_only(db_path)?;
        log::info!("📥 Event reader opened: {}", db_path.display());
        Ok(Self { conn })
    }

    /// Events with `start <= timestamp < end`, ordered by timestamp then id
    pub fn read_range(&self, start: i64, end: i64) -> Result<Vec<InteractionEvent>, ReaderError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, actor_id, mentions, tags, links
             FROM events
             WHERE timestamp >= ?1 AND timestamp < ?2
             ORDER BY timestamp ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![start, end], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut events = Vec::new();
        let mut malformed = 0usize;
        for row in rows {
            let (id, timestamp, actor_id, mentions, tags, links) = row?;
            let parsed = (|| -> Result<InteractionEvent, serde_json::Error> {
                Ok(InteractionEvent {
                    timestamp,
                    actor_id,
                    mentions: parse_json_set(mentions)?,
                    tags: parse_json_set(tags)?,
                    links: parse_json_set(links)?,
                })
            })();

            match parsed {
                Ok(event) => events.push(event),
                Err(e) => {
                    malformed += 1;
                    log::warn!("⚠️  Skipping event id={}: {}", id, e);
                }
            }
        }

        log::debug!(
            "📥 Read {} events in [{}, {}), {} malformed",
            events.len(),
            start,
            end,
            malformed
        );
        Ok(events)
    }
}

impl EventSource for SqliteEventReader {
    fn events_between(&self, start: i64, end: i64) -> Result<Vec<InteractionEvent>, ReaderError> {
        self.read_range(start, end)
    }
}

/// Reads `prices(partition, timestamp, close)`
pub struct SqlitePriceReader {
    conn: Connection,
}

impl SqlitePriceReader {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let db_path = db_path.as_ref();
        let conn = open_read_only(db_path)?;
        log::info!("📥 Price reader opened: {}", db_path.display());
        Ok(Self { conn })
    }

    /// Close prices of one partition with `start <= timestamp < end`
    pub fn read_range(
        &self,
        partition: PartitionSize,
        start: i64,
        end: i64,
    ) -> Result<TimeSeries, ReaderError> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, close
             FROM prices
             WHERE partition = ?1 AND timestamp >= ?2 AND timestamp < ?3
             ORDER BY timestamp ASC",
        )?;

        let points = stmt
            .query_map(params![partition.as_str(), start, end], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TimeSeries::from_unordered("close", points))
    }
}

impl PriceSource for SqlitePriceReader {
    fn prices_between(
        &self,
        partition: PartitionSize,
        start: i64,
        end: i64,
    ) -> Result<TimeSeries, ReaderError> {
        self.read_range(partition, start, end)
    }
}
