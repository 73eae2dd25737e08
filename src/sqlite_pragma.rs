//! Shared SQLite PRAGMA setup
//!
//! WAL lets a reader keep seeing the last committed snapshot while a
//! replace transaction is in flight.

use rusqlite::Connection;

pub fn apply_optimized_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    // journal_mode answers with the resulting mode
    let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    if !mode.eq_ignore_ascii_case("wal") {
        log::warn!("⚠️  SQLite journal_mode is '{}', WAL not available", mode);
    }
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;

    log::debug!("📊 Applied SQLite PRAGMAs (WAL, NORMAL, MEMORY)");
    Ok(())
}
