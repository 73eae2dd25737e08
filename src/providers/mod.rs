//! Source providers and the ordered fallback chain
//!
//! Each provider returns a raw (unranked) holder list. The chain cleans each
//! answer with `normalize` and takes the first one with usable rows left:
//!
//! ```text
//! primary ──(error | empty | unusable | timeout)──▶ fallback ──(...)──▶ no data
//!    │                                      │
//!    └─────────── Data(rows) ───────────────┴──▶ RankingPipeline
//! ```

pub mod file_source;
pub mod http_source;
pub mod parse;

pub use file_source::FileSource;
pub use http_source::HttpJsonSource;

use crate::pipeline::ranking::normalize;
use crate::pipeline::types::RawHolder;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
pub enum ProviderError {
    Http(String),
    Status(u16),
    Io(std::io::Error),
    Parse(String),
    Timeout(Duration),
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        ProviderError::Io(err)
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Http(err.to_string())
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Http(e) => write!(f, "HTTP error: {}", e),
            ProviderError::Status(code) => write!(f, "Unexpected HTTP status: {}", code),
            ProviderError::Io(e) => write!(f, "IO error: {}", e),
            ProviderError::Parse(e) => write!(f, "Parse error: {}", e),
            ProviderError::Timeout(d) => write!(f, "Timed out after {}ms", d.as_millis()),
        }
    }
}

impl std::error::Error for ProviderError {}

/// A source of holder rankings
///
/// Implementations drop malformed rows instead of failing the whole fetch.
#[async_trait]
pub trait HolderSource: Send + Sync {
    /// Identifier stamped on every record this source produces
    fn name(&self) -> &str;

    /// Fetch up to `n` of the largest holders (order not guaranteed)
    async fn fetch_top(&self, n: usize) -> Result<Vec<RawHolder>, ProviderError>;
}

/// Result of asking a single provider
#[derive(Debug)]
pub enum FetchOutcome {
    Data(Vec<RawHolder>),
    Empty,
    Failed(ProviderError),
}

impl FetchOutcome {
    /// Classify a provider answer; rows that do not survive `normalize` count as empty
    pub fn from_result(result: Result<Vec<RawHolder>, ProviderError>) -> Self {
        match result.map(normalize) {
            Ok(rows) if rows.is_empty() => FetchOutcome::Empty,
            Ok(rows) => FetchOutcome::Data(rows),
            Err(e) => FetchOutcome::Failed(e),
        }
    }
}

/// Normalized rows produced by the first provider with usable data
#[derive(Debug)]
pub struct ChainResult {
    pub source: String,
    pub rows: Vec<RawHolder>,
}

/// Ordered providers: empty and error both trigger fallback
pub struct ProviderChain {
    sources: Vec<Arc<dyn HolderSource>>,
    timeout: Duration,
}

impl ProviderChain {
    pub fn new(sources: Vec<Arc<dyn HolderSource>>, timeout: Duration) -> Self {
        Self { sources, timeout }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Ask one provider, bounded by the chain timeout
    pub async fn try_source(&self, source: &dyn HolderSource, n: usize) -> FetchOutcome {
        match tokio::time::timeout(self.timeout, source.fetch_top(n)).await {
            Ok(result) => FetchOutcome::from_result(result),
            Err(_) => FetchOutcome::Failed(ProviderError::Timeout(self.timeout)),
        }
    }

    /// First non-empty answer, `None` if every provider failed or was empty
    pub async fn fetch(&self, n: usize) -> Option<ChainResult> {
        for source in &self.sources {
            match self.try_source(source.as_ref(), n).await {
                FetchOutcome::Data(rows) => {
                    log::info!("✅ Provider '{}' returned {} holders", source.name(), rows.len());
                    return Some(ChainResult {
                        source: source.name().to_string(),
                        rows,
                    });
                }
                FetchOutcome::Empty => {
                    log::warn!("⚠️  Provider '{}' returned no usable holders, trying next", source.name());
                }
                FetchOutcome::Failed(e) => {
                    log::warn!("⚠️  Provider '{}' unavailable, trying next: {}", source.name(), e);
                }
            }
        }

        log::error!("❌ All {} providers failed or were empty", self.sources.len());
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Rows(usize),
        Unusable(usize),
        Fail,
        Hang,
    }

    struct MockSource {
        name: String,
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl MockSource {
        fn new(name: &str, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                behavior,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl HolderSource for MockSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch_top(&self, _n: usize) -> Result<Vec<RawHolder>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Rows(count) => Ok((0..count)
                    .map(|i| RawHolder {
                        address: format!("0x{:040x}", i),
                        label: None,
                        balance: Decimal::from(i as i64 + 1),
                        source: self.name.clone(),
                    })
                    .collect()),
                Behavior::Unusable(count) => Ok((0..count)
                    .map(|i| RawHolder {
                        address: if i % 2 == 0 { "  ".to_string() } else { format!("0x{:040x}", i) },
                        label: None,
                        balance: Decimal::from(-(i as i64) - 1),
                        source: self.name.clone(),
                    })
                    .collect()),
                Behavior::Fail => Err(ProviderError::Status(503)),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    fn chain(sources: Vec<Arc<MockSource>>) -> ProviderChain {
        let sources = sources
            .into_iter()
            .map(|s| s as Arc<dyn HolderSource>)
            .collect();
        ProviderChain::new(sources, Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_primary_answers() {
        let primary = MockSource::new("primary", Behavior::Rows(3));
        let fallback = MockSource::new("fallback", Behavior::Rows(5));

        let result = chain(vec![primary.clone(), fallback.clone()]).fetch(100).await.unwrap();

        assert_eq!(result.source, "primary");
        assert_eq!(result.rows.len(), 3);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_error_falls_back() {
        let primary = MockSource::new("primary", Behavior::Fail);
        let fallback = MockSource::new("fallback", Behavior::Rows(2));

        let result = chain(vec![primary, fallback]).fetch(100).await.unwrap();
        assert_eq!(result.source, "fallback");
    }

    #[tokio::test]
    async fn test_empty_falls_back() {
        let primary = MockSource::new("primary", Behavior::Rows(0));
        let fallback = MockSource::new("fallback", Behavior::Rows(2));

        let result = chain(vec![primary, fallback]).fetch(100).await.unwrap();
        assert_eq!(result.source, "fallback");
    }

    #[tokio::test]
    async fn test_unusable_rows_fall_back() {
        let primary = MockSource::new("primary", Behavior::Unusable(4));
        let fallback = MockSource::new("fallback", Behavior::Rows(2));

        let result = chain(vec![primary.clone(), fallback]).fetch(100).await.unwrap();

        assert_eq!(result.source, "fallback");
        assert_eq!(result.rows.len(), 2);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let primary = MockSource::new("primary", Behavior::Hang);
        let fallback = MockSource::new("fallback", Behavior::Rows(1));

        let result = chain(vec![primary, fallback]).fetch(100).await.unwrap();
        assert_eq!(result.source, "fallback");
    }

    #[tokio::test]
    async fn test_all_fail() {
        let primary = MockSource::new("primary", Behavior::Fail);
        let fallback = MockSource::new("fallback", Behavior::Rows(0));

        assert!(chain(vec![primary, fallback]).fetch(100).await.is_none());
    }

    #[test]
    fn test_outcome_classification() {
        assert!(matches!(FetchOutcome::from_result(Ok(Vec::new())), FetchOutcome::Empty));
        let negative = RawHolder {
            address: "0x1".to_string(),
            label: None,
            balance: Decimal::from(-1),
            source: "test".to_string(),
        };
        assert!(matches!(FetchOutcome::from_result(Ok(vec![negative])), FetchOutcome::Empty));
        assert!(matches!(
            FetchOutcome::from_result(Err(ProviderError::Status(500))),
            FetchOutcome::Failed(_)
        ));
    }
}
