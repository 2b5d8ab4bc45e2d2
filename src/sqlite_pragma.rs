//! Shared SQLite connection tuning for readers and writers

use rusqlite::Connection;

/// Apply the PRAGMAs every socialflow connection runs with
///
/// WAL journal, NORMAL sync, in-memory temp store, 256MB mmap and a 64MB page cache.
/// Readers switch to `query_only` afterwards.
pub fn apply_optimized_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "mmap_size", 268_435_456i64)?;
    conn.pragma_update(None, "cache_size", -64_000i64)?;
    conn.pragma_update(None, "wal_autocheckpoint", 1000i64)?;
    Ok(())
}
