//! In-memory backend (tests, embedding without durable storage)

use super::{SnapshotBackend, SnapshotDocument, StoreError};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryBackend {
    document: Mutex<Option<SnapshotDocument>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with a document
    pub fn with_document(document: SnapshotDocument) -> Self {
        Self {
            document: Mutex::new(Some(document)),
        }
    }
}

#[async_trait]
impl SnapshotBackend for MemoryBackend {
    async fn read(&self) -> Result<Option<SnapshotDocument>, StoreError> {
        let guard = self
            .document
            .lock()
            .map_err(|e| StoreError::Database(format!("memory backend poisoned: {}", e)))?;
        Ok(guard.clone())
    }

    async fn write(&self, document: &SnapshotDocument) -> Result<(), StoreError> {
        let mut guard = self
            .document
            .lock()
            .map_err(|e| StoreError::Database(format!("memory backend poisoned: {}", e)))?;
        *guard = Some(document.clone());
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}
