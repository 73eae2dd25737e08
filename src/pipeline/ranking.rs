//! Ranking Pipeline - fetch, normalize, rank, diff, persist
//!
//! ```text
//! ProviderChain::fetch()          primary → fallback, normalize() per answer
//!     ↓
//! rank_holders()                  balance desc, dedup, top N, rank 1..n
//!     ↓
//! ChangeEngine::compute_changes() against SnapshotStore::load()
//!     ↓
//! SnapshotStore::save()           skipped when there is nothing to save
//! ```
//!
//! One load-compute-save cycle runs at a time per pipeline instance, so two
//! concurrent report commands never compare against a half-updated history.

use super::engine::ChangeEngine;
use super::types::{normalize_address, ChangeResult, HolderRecord, RawHolder};
use crate::providers::ProviderChain;
use crate::store::SnapshotStore;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tokio::sync::Mutex;

pub const DEFAULT_TOP_N: usize = 100;

/// What happened to the snapshot at the end of a run
#[derive(Debug, Clone, PartialEq)]
pub enum Persistence {
    Saved,
    /// Nothing fetched, previous snapshot left untouched
    SkippedEmpty,
    /// Results are valid but were not stored for the next comparison
    Failed(String),
}

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub struct Report {
    pub results: Vec<ChangeResult>,
    /// Provider that supplied the data, `None` when every provider failed
    pub source: Option<String>,
    pub persistence: Persistence,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn flagged(&self) -> impl Iterator<Item = &ChangeResult> {
        self.results.iter().filter(|r| r.flag)
    }
}

/// Clean up provider rows
///
/// Drops rows with an empty address or a negative balance and turns blank
/// labels into `None`. Address casing is preserved.
pub fn normalize(raw: Vec<RawHolder>) -> Vec<RawHolder> {
    raw.into_iter()
        .filter_map(|mut row| {
            row.address = row.address.trim().to_string();
            if row.address.is_empty() || row.balance < Decimal::ZERO {
                log::debug!("Dropping holder row '{}' ({})", row.address, row.balance);
                return None;
            }
            row.label = row
                .label
                .map(|label| label.trim().to_string())
                .filter(|label| !label.is_empty());
            Some(row)
        })
        .collect()
}

/// Sort by balance descending, keep the first row per address, take `top_n`
/// and assign 1-based ranks
pub fn rank_holders(mut rows: Vec<RawHolder>, top_n: usize) -> Vec<HolderRecord> {
    // Stable: equal balances keep provider order
    rows.sort_by(|a, b| b.balance.cmp(&a.balance));

    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(normalize_address(&row.address)))
        .take(top_n)
        .enumerate()
        .map(|(idx, row)| HolderRecord {
            address: row.address,
            // -0 normalizes to 0
            balance: row.balance.abs(),
            label: row.label,
            source: row.source,
            rank: idx as u32 + 1,
        })
        .collect()
}

pub struct RankingPipeline {
    providers: ProviderChain,
    store: SnapshotStore,
    engine: ChangeEngine,
    top_n: usize,
    run_lock: Mutex<()>,
}

impl RankingPipeline {
    pub fn new(providers: ProviderChain, store: SnapshotStore) -> Self {
        Self {
            providers,
            store,
            engine: ChangeEngine::with_defaults(),
            top_n: DEFAULT_TOP_N,
            run_lock: Mutex::new(()),
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_flag_threshold(mut self, threshold_pct: Decimal) -> Self {
        self.engine = ChangeEngine::new(threshold_pct);
        self
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Run one full cycle and return the enriched, rank-ordered list
    ///
    /// Provider failures and storage problems never surface as errors here;
    /// they are reflected in `Report::source` and `Report::persistence`.
    pub async fn produce_report(&self) -> Report {
        let _guard = self.run_lock.lock().await;

        let fetched = self.providers.fetch(self.top_n).await;
        let (source, raw) = match fetched {
            Some(result) => (Some(result.source), result.rows),
            None => (None, Vec::new()),
        };

        // Rows arrive normalized from the chain
        let ranked = rank_holders(raw, self.top_n);

        if ranked.is_empty() {
            log::warn!("⚠️  No holder data available, keeping previous snapshot");
            return Report {
                results: Vec::new(),
                source,
                persistence: Persistence::SkippedEmpty,
            };
        }

        let previous = self.store.load().await;
        let results = self.engine.compute_changes(&ranked, &previous);

        let persistence = match self.store.save(&ranked).await {
            Ok(()) => Persistence::Saved,
            Err(e) => {
                log::error!("❌ Failed to save snapshot ({} backend): {}", self.store.backend_type(), e);
                Persistence::Failed(e.to_string())
            }
        };

        log::info!(
            "📊 Ranked {} holders ({} flagged, {} new) from {}",
            results.len(),
            results.iter().filter(|r| r.flag).count(),
            results.iter().filter(|r| r.change_pct.is_none()).count(),
            source.as_deref().unwrap_or("unknown")
        );

        Report {
            results,
            source,
            persistence,
        }
    }
}
