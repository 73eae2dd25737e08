use crate::providers::{FileSource, HolderSource, HttpJsonSource, ProviderError};
use crate::report::DEFAULT_MAX_CHARS;
use std::env;
use std::sync::Arc;
use std::time::Duration;

/// Where a provider reads its holder list from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    /// `file:<path>`
    File(String),
    /// `http(s)://...`, optionally with a `{page}` placeholder
    Http(String),
}

impl SourceSpec {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let value = value.trim();

        if let Some(path) = value.strip_prefix("file:") {
            if path.is_empty() {
                return Err(ConfigError::InvalidValue("file: source needs a path".to_string()));
            }
            return Ok(SourceSpec::File(path.to_string()));
        }

        if value.starts_with("http://") || value.starts_with("https://") {
            return Ok(SourceSpec::Http(value.to_string()));
        }

        Err(ConfigError::InvalidValue(format!(
            "source '{}' must start with file:, http:// or https://",
            value
        )))
    }

    pub fn build(
        &self,
        name: &str,
        pages: u32,
        timeout: Duration,
    ) -> Result<Arc<dyn HolderSource>, ProviderError> {
        match self {
            SourceSpec::File(path) => Ok(Arc::new(FileSource::new(name, path))),
            SourceSpec::Http(url) => Ok(Arc::new(HttpJsonSource::with_timeout(name, url, pages, timeout)?)),
        }
    }
}

/// Configuration loaded from environment variables
pub struct Config {
    /// Ordered provider list, primary first
    pub sources: Vec<(String, SourceSpec)>,
    pub source_pages: u32,
    pub report_max_chars: usize,
    pub asset_symbol: String,
    pub rust_log: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables
    ///
    /// `PRIMARY_SOURCE` and `FALLBACK_SOURCE` are each optional, but at least
    /// one must be set. Provider names are `primary` and `fallback`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut sources = Vec::new();

        for (var, name) in [("PRIMARY_SOURCE", "primary"), ("FALLBACK_SOURCE", "fallback")] {
            if let Ok(value) = env::var(var) {
                if !value.trim().is_empty() {
                    sources.push((name.to_string(), SourceSpec::parse(&value)?));
                }
            }
        }

        if sources.is_empty() {
            return Err(ConfigError::MissingVariable("PRIMARY_SOURCE".to_string()));
        }

        let source_pages = env::var("SOURCE_PAGES")
            .unwrap_or_else(|_| "4".to_string())
            .parse::<u32>()
            .unwrap_or(4);

        let report_max_chars = env::var("REPORT_MAX_CHARS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_CHARS);

        let asset_symbol = env::var("ASSET_SYMBOL").unwrap_or_else(|_| "ETH".to_string());

        let rust_log = env::var("RUST_LOG").ok();

        Ok(Self {
            sources,
            source_pages,
            report_max_chars,
            asset_symbol,
            rust_log,
        })
    }

    /// Instantiate the configured providers, in fallback order
    pub fn build_sources(&self, timeout: Duration) -> Result<Vec<Arc<dyn HolderSource>>, ProviderError> {
        self.sources
            .iter()
            .map(|(name, spec)| spec.build(name, self.source_pages, timeout))
            .collect()
    }
}
