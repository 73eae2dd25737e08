//! JSON file backend for the snapshot
//!
//! Every write goes to its own uniquely named temp file in the target
//! directory, which is fsynced and renamed over the target. Readers never
//! observe a partially written snapshot, and concurrent writers (separate
//! processes included) never share a temp file.

use super::{SnapshotBackend, SnapshotDocument, StoreError};
use async_trait::async_trait;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_document(path: &Path) -> Result<Option<SnapshotDocument>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }

    let json = fs::read_to_string(path)?;
    let document: SnapshotDocument = serde_json::from_str(&json)?;
    Ok(Some(document))
}

fn write_document(path: &Path, document: &SnapshotDocument) -> Result<(), StoreError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // Create storage on first use
    fs::create_dir_all(parent)?;

    let json = serde_json::to_string_pretty(document)?;

    // Removed on drop if anything below fails
    let mut temp = tempfile::Builder::new()
        .prefix(".snapshot-")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    temp.write_all(json.as_bytes())?;
    temp.as_file().sync_all()?;

    persist(temp, path)
}

fn persist(temp: NamedTempFile, path: &Path) -> Result<(), StoreError> {
    temp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl SnapshotBackend for JsonFileBackend {
    async fn read(&self) -> Result<Option<SnapshotDocument>, StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_document(&path)).await?
    }

    async fn write(&self, document: &SnapshotDocument) -> Result<(), StoreError> {
        let path = self.path.clone();
        let document = document.clone();

        let result = tokio::task::spawn_blocking(move || write_document(&path, &document)).await?;

        if result.is_ok() {
            log::debug!("Saved snapshot to {}", self.path.display());
        }
        result
    }

    fn backend_type(&self) -> &'static str {
        "JSON"
    }
}
