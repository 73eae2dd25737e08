//! Generic JSON-over-HTTP holder feed
//!
//! Fetches a URL returning one of the document shapes understood by
//! [`parse_document`](super::parse::parse_document). A `{page}` placeholder
//! in the URL makes the source fetch pages `1..=pages` concurrently; pages
//! that fail are dropped and the rest are merged.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use holderwatch::providers::{HolderSource, HttpJsonSource};
//!
//! let source = HttpJsonSource::new("mirror", "https://example.org/top?page={page}", 4)?;
//! let rows = source.fetch_top(100).await?;
//! ```

use super::parse::parse_document;
use super::{HolderSource, ProviderError};
use crate::pipeline::types::RawHolder;
use async_trait::async_trait;
use std::time::Duration;
use tokio::task::JoinSet;

const USER_AGENT: &str = "holderwatch/0.1";

pub struct HttpJsonSource {
    name: String,
    url_template: String,
    pages: u32,
    client: reqwest::Client,
}

impl HttpJsonSource {
    pub fn new(
        name: impl Into<String>,
        url_template: impl Into<String>,
        pages: u32,
    ) -> Result<Self, ProviderError> {
        Self::with_timeout(name, url_template, pages, Duration::from_secs(30))
    }

    pub fn with_timeout(
        name: impl Into<String>,
        url_template: impl Into<String>,
        pages: u32,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            name: name.into(),
            url_template: url_template.into(),
            pages: pages.max(1),
            client,
        })
    }

    /// URLs to fetch: one per page when the template is paged, else one
    pub fn page_urls(&self) -> Vec<String> {
        if self.url_template.contains("{page}") {
            (1..=self.pages)
                .map(|page| self.url_template.replace("{page}", &page.to_string()))
                .collect()
        } else {
            vec![self.url_template.clone()]
        }
    }
}

async fn fetch_page(
    client: reqwest::Client,
    url: String,
    source: String,
) -> Result<Vec<RawHolder>, ProviderError> {
    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        return Err(ProviderError::Status(response.status().as_u16()));
    }

    let document: serde_json::Value = response.json().await?;
    parse_document(&document, &source)
}

#[async_trait]
impl HolderSource for HttpJsonSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_top(&self, n: usize) -> Result<Vec<RawHolder>, ProviderError> {
        let urls = self.page_urls();
        let page_count = urls.len();

        let mut tasks = JoinSet::new();
        for url in urls {
            tasks.spawn(fetch_page(self.client.clone(), url, self.name.clone()));
        }

        let mut rows = Vec::new();
        let mut last_error = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(page_rows)) => rows.extend(page_rows),
                Ok(Err(e)) => {
                    log::debug!("⚠️  Page fetch failed for {}: {}", self.name, e);
                    last_error = Some(e);
                }
                Err(e) => {
                    log::debug!("⚠️  Page task failed for {}: {}", self.name, e);
                    last_error = Some(ProviderError::Http(e.to_string()));
                }
            }
        }

        // Every page failed: report the source as unavailable
        if rows.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        log::debug!("Fetched {} holders from {} page(s) of {}", rows.len(), page_count, self.name);

        rows.sort_by(|a, b| b.balance.cmp(&a.balance));
        rows.truncate(n);
        Ok(rows)
    }
}
