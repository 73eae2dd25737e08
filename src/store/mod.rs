//! Snapshot Store - durable "previous" snapshot for change detection
//!
//! The store holds exactly one snapshot. Every successful pipeline run
//! replaces it wholesale with the new ranked list.
//!
//! ```text
//! RankingPipeline
//!     ↓ load() / save()
//! SnapshotStore            (never fails on read, degrades to empty history)
//!     ↓ read() / write()
//! SnapshotBackend          (JSON file | SQLite | memory)
//! ```

pub mod json_store;
pub mod memory_store;
pub mod sqlite_store;

pub use json_store::JsonFileBackend;
pub use memory_store::MemoryBackend;
pub use sqlite_store::SqliteBackend;

use crate::pipeline::types::{snapshot_from_records, HolderRecord, Snapshot};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
    Database(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, err))
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "IO error: {}", e),
            StoreError::Serialization(e) => write!(f, "Serialization error: {}", e),
            StoreError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackendType {
    Json,
    Sqlite,
}

impl BackendType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(BackendType::Json),
            "sqlite" => Some(BackendType::Sqlite),
            _ => None,
        }
    }

    pub fn default_path(&self) -> &'static str {
        match self {
            BackendType::Json => "data/last_top100.json",
            BackendType::Sqlite => "data/holderwatch.db",
        }
    }
}

/// Persisted document: the snapshot plus when it was written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub saved_at: i64,
    pub holders: Snapshot,
}

impl SnapshotDocument {
    pub fn new(holders: Snapshot) -> Self {
        Self {
            saved_at: chrono::Utc::now().timestamp(),
            holders,
        }
    }
}

/// Storage backend for the snapshot
///
/// `write` must replace the previous document atomically: a concurrent
/// reader sees either the old or the new snapshot, never a mix.
#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    /// Read the persisted document, `Ok(None)` when nothing was saved yet
    async fn read(&self) -> Result<Option<SnapshotDocument>, StoreError>;

    /// Replace the persisted document
    async fn write(&self, document: &SnapshotDocument) -> Result<(), StoreError>;

    /// Get backend type for logging
    fn backend_type(&self) -> &'static str;
}

/// Open the configured backend
pub fn open_backend(
    backend: BackendType,
    path: &str,
) -> Result<Arc<dyn SnapshotBackend>, StoreError> {
    match backend {
        BackendType::Json => Ok(Arc::new(JsonFileBackend::new(path))),
        BackendType::Sqlite => Ok(Arc::new(SqliteBackend::new(path)?)),
    }
}

/// `load`/`save` contract over an injected backend
#[derive(Clone)]
pub struct SnapshotStore {
    backend: Arc<dyn SnapshotBackend>,
}

impl SnapshotStore {
    pub fn new(backend: Arc<dyn SnapshotBackend>) -> Self {
        Self { backend }
    }

    /// In-memory store, nothing persisted across processes
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn backend_type(&self) -> &'static str {
        self.backend.backend_type()
    }

    /// Last persisted snapshot
    ///
    /// Missing or unreadable data is treated as "no history".
    pub async fn load(&self) -> Snapshot {
        match self.backend.read().await {
            Ok(Some(document)) => {
                log::debug!(
                    "📊 Loaded snapshot with {} holders from {} backend",
                    document.holders.len(),
                    self.backend.backend_type()
                );
                document.holders
            }
            Ok(None) => {
                log::info!("No previous snapshot found, starting with empty history");
                Snapshot::new()
            }
            Err(e) => {
                log::warn!(
                    "⚠️  Snapshot unreadable ({} backend), treating history as empty: {}",
                    self.backend.backend_type(),
                    e
                );
                Snapshot::new()
            }
        }
    }

    /// Replace the persisted snapshot with `records`, keyed by lowercase address
    pub async fn save(&self, records: &[HolderRecord]) -> Result<(), StoreError> {
        let document = SnapshotDocument::new(snapshot_from_records(records));
        self.backend.write(&document).await?;

        log::debug!(
            "✅ Saved snapshot with {} holders to {} backend",
            document.holders.len(),
            self.backend.backend_type()
        );
        Ok(())
    }
}
