//! SQLite backend for the snapshot
//!
//! One row per holder. A save deletes every row and inserts the new list
//! inside a single transaction. Balances are stored as TEXT so decimals
//! round-trip without float conversion.

use super::{SnapshotBackend, SnapshotDocument, StoreError};
use crate::pipeline::types::{HolderRecord, Snapshot};
use crate::sqlite_pragma::apply_optimized_pragmas;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Io(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        format!("Failed to create database directory {}: {}", parent.display(), e),
                    ))
                })?;
            }
        }

        let conn = Connection::open(db_path)?;
        apply_optimized_pragmas(&conn)?;
        Self::init_schema(&conn)?;

        log::info!("✅ SQLite snapshot store initialized");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS holder_snapshot (
                address_key TEXT PRIMARY KEY,
                address TEXT NOT NULL,
                balance TEXT NOT NULL,
                label TEXT,
                source TEXT NOT NULL,
                rank INTEGER NOT NULL,
                saved_at INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
    conn.lock()
        .map_err(|e| StoreError::Database(format!("connection mutex poisoned: {}", e)))
}

fn read_rows(conn: &Connection) -> Result<Option<SnapshotDocument>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT address_key, address, balance, label, source, rank, saved_at
         FROM holder_snapshot ORDER BY rank ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, u32>(5)?,
            row.get::<_, i64>(6)?,
        ))
    })?;

    let mut holders = Snapshot::new();
    let mut saved_at = None;

    for row in rows {
        let (key, address, balance, label, source, rank, row_saved_at) = row?;

        let balance = match Decimal::from_str(&balance) {
            Ok(balance) => balance,
            Err(e) => {
                log::warn!("⚠️  Skipping snapshot row {} with bad balance '{}': {}", key, balance, e);
                continue;
            }
        };

        saved_at = Some(row_saved_at);
        holders.insert(
            key,
            HolderRecord {
                address,
                balance,
                label,
                source,
                rank,
            },
        );
    }

    Ok(saved_at.map(|saved_at| SnapshotDocument { saved_at, holders }))
}

fn replace_rows(conn: &mut Connection, document: &SnapshotDocument) -> Result<(), StoreError> {
    let tx = conn.transaction()?;

    tx.execute("DELETE FROM holder_snapshot", [])?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO holder_snapshot
             (address_key, address, balance, label, source, rank, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;

        for (key, record) in &document.holders {
            stmt.execute(params![
                key,
                record.address,
                record.balance.to_string(),
                record.label,
                record.source,
                record.rank,
                document.saved_at,
            ])?;
        }
    }

    tx.commit()?;
    Ok(())
}

#[async_trait]
impl SnapshotBackend for SqliteBackend {
    async fn read(&self) -> Result<Option<SnapshotDocument>, StoreError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<SnapshotDocument>, StoreError> {
            let guard = lock(&conn)?;
            read_rows(&guard)
        })
        .await?
    }

    async fn write(&self, document: &SnapshotDocument) -> Result<(), StoreError> {
        let conn = self.conn.clone();
        let document = document.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let mut guard = lock(&conn)?;
            replace_rows(&mut guard, &document)?;
            log::debug!("✅ Replaced {} snapshot rows in SQLite", document.holders.len());
            Ok(())
        })
        .await?
    }

    fn backend_type(&self) -> &'static str {
        "SQLite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::snapshot_from_records;
    use tempfile::tempdir;

    fn record(address: &str, balance: &str, rank: u32) -> HolderRecord {
        HolderRecord {
            address: address.to_string(),
            balance: balance.parse().unwrap(),
            label: if rank == 1 { Some("Binance 7".to_string()) } else { None },
            source: "oklink".to_string(),
            rank,
        }
    }

    #[tokio::test]
    async fn test_empty_database_reads_as_none() {
        let dir = tempdir().unwrap();
        let backend = SqliteBackend::new(dir.path().join("test.db")).unwrap();

        assert!(backend.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_round_trip_is_exact() {
        let dir = tempdir().unwrap();
        let backend = SqliteBackend::new(dir.path().join("test.db")).unwrap();

        let records = vec![
            record("0xBE0eB53F46cd790Cd13851d5EFf43D12404d33E8", "1996008.377108762938287621", 1),
            record("0x40B38765696e3d5d8d9d834D8AaD4bB6e418E489", "1.5", 2),
        ];
        let doc = SnapshotDocument::new(snapshot_from_records(&records));

        backend.write(&doc).await.unwrap();
        let loaded = backend.read().await.unwrap().unwrap();

        assert_eq!(loaded, doc);
    }

    #[tokio::test]
    async fn test_write_replaces_all_rows() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let backend = SqliteBackend::new(&db_path).unwrap();

        let first = snapshot_from_records(&[record("0x1", "1", 1), record("0x2", "2", 2)]);
        let second = snapshot_from_records(&[record("0x3", "3", 1)]);

        backend.write(&SnapshotDocument::new(first)).await.unwrap();
        backend.write(&SnapshotDocument::new(second)).await.unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM holder_snapshot", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_bad_balance_row_is_skipped() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let backend = SqliteBackend::new(&db_path).unwrap();

        let doc = SnapshotDocument::new(snapshot_from_records(&[record("0x1", "10", 1)]));
        backend.write(&doc).await.unwrap();

        let conn = Connection::open(&db_path).unwrap();
        conn.execute(
            "INSERT INTO holder_snapshot VALUES ('0x2', '0x2', 'lots', NULL, 'x', 2, 0)",
            [],
        )
        .unwrap();

        let loaded = backend.read().await.unwrap().unwrap();
        assert_eq!(loaded.holders.len(), 1);
        assert!(loaded.holders.contains_key("0x1"));
    }

    #[tokio::test]
    async fn test_wal_mode_enabled() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let _backend = SqliteBackend::new(&db_path).unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(journal_mode.to_lowercase(), "wal");
    }
}
