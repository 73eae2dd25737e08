//! Pipeline configuration from environment variables

use super::engine::DEFAULT_FLAG_THRESHOLD_PCT;
use super::ranking::DEFAULT_TOP_N;
use crate::store::BackendType;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the ranking pipeline
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Snapshot storage backend
    pub backend: BackendType,

    /// Path to the snapshot file or SQLite database
    pub snapshot_path: String,

    /// Number of holders to rank
    pub top_n: usize,

    /// Absolute percentage change that flags a holder
    pub flag_threshold_pct: Decimal,

    /// Upper bound for a single provider call
    pub provider_timeout: Duration,
}

impl PipelineConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `SNAPSHOT_BACKEND` (default: json)
    /// - `SNAPSHOT_PATH` (default: data/last_top100.json, data/holderwatch.db for sqlite)
    /// - `TOP_N` (default: 100)
    /// - `FLAG_THRESHOLD_PCT` (default: 50)
    /// - `PROVIDER_TIMEOUT_MS` (default: 30000)
    pub fn from_env() -> Self {
        let backend = match env::var("SNAPSHOT_BACKEND") {
            Ok(value) => BackendType::from_str(&value).unwrap_or_else(|| {
                log::warn!("Invalid SNAPSHOT_BACKEND '{}', defaulting to json", value);
                BackendType::Json
            }),
            Err(_) => BackendType::Json,
        };

        Self {
            backend,

            snapshot_path: env::var("SNAPSHOT_PATH")
                .unwrap_or_else(|_| backend.default_path().to_string()),

            top_n: env::var("TOP_N")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(DEFAULT_TOP_N),

            flag_threshold_pct: env::var("FLAG_THRESHOLD_PCT")
                .ok()
                .and_then(|s| Decimal::from_str(s.trim()).ok())
                .map(|pct| pct.abs())
                .unwrap_or_else(|| Decimal::from(DEFAULT_FLAG_THRESHOLD_PCT)),

            provider_timeout: Duration::from_millis(
                env::var("PROVIDER_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30_000),
            ),
        }
    }
}
