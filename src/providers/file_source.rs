//! Holder feed read from a local JSON file (exports, fixtures, mirrors)

use super::parse::parse_document;
use super::{HolderSource, ProviderError};
use crate::pipeline::types::RawHolder;
use async_trait::async_trait;
use std::path::PathBuf;

pub struct FileSource {
    name: String,
    path: PathBuf,
}

impl FileSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl HolderSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_top(&self, n: usize) -> Result<Vec<RawHolder>, ProviderError> {
        let json = tokio::fs::read_to_string(&self.path).await?;
        let document: serde_json::Value = serde_json::from_str(&json)?;

        let mut rows = parse_document(&document, &self.name)?;
        rows.sort_by(|a, b| b.balance.cmp(&a.balance));
        rows.truncate(n);

        log::debug!("Read {} holders from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}
