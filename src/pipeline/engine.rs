//! Change Engine - per-address balance change detection
//!
//! Pure function of (current ranked list, previous snapshot) → enriched list.
//! No I/O, no sorting: the caller hands over records already ordered by rank.
//!
//! ## Rules
//!
//! | previous        | current | change_pct          | flag                  |
//! |-----------------|---------|---------------------|-----------------------|
//! | missing         | any     | `None`              | false                 |
//! | `p > 0`         | `c`     | `(c - p) / p * 100` | `abs >= threshold`    |
//! | `0`             | `> 0`   | `NewBalance`        | true                  |
//! | `0`             | `0`     | `None`              | false                 |

use super::types::{normalize_address, ChangePct, ChangeResult, HolderRecord, Snapshot};
use rust_decimal::Decimal;

/// Default swing threshold in percent
pub const DEFAULT_FLAG_THRESHOLD_PCT: i64 = 50;

/// Computes change metrics against a previous snapshot
#[derive(Debug, Clone)]
pub struct ChangeEngine {
    flag_threshold_pct: Decimal,
}

impl ChangeEngine {
    pub fn new(flag_threshold_pct: Decimal) -> Self {
        Self {
            flag_threshold_pct: flag_threshold_pct.abs(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(Decimal::from(DEFAULT_FLAG_THRESHOLD_PCT))
    }

    pub fn flag_threshold_pct(&self) -> Decimal {
        self.flag_threshold_pct
    }

    /// Enrich `current` with change metrics against `previous`
    ///
    /// `rank` is reassigned from the input position (1-based). Duplicate
    /// addresses in `current` are each compared independently.
    pub fn compute_changes(&self, current: &[HolderRecord], previous: &Snapshot) -> Vec<ChangeResult> {
        current
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                let prev_balance = previous
                    .get(&normalize_address(&record.address))
                    .map(|prev| prev.balance);

                let change_pct = change_between(prev_balance, record.balance);
                let flag = self.is_flagged(change_pct);

                let mut record = record.clone();
                record.rank = idx as u32 + 1;

                ChangeResult {
                    record,
                    change_pct,
                    flag,
                }
            })
            .collect()
    }

    /// Whether a change is large enough to warrant attention
    pub fn is_flagged(&self, change_pct: Option<ChangePct>) -> bool {
        match change_pct {
            Some(ChangePct::NewBalance) => true,
            Some(ChangePct::Percent(pct)) => pct.abs() >= self.flag_threshold_pct,
            None => false,
        }
    }
}

impl Default for ChangeEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Percentage change from `previous` to `current`
pub fn change_between(previous: Option<Decimal>, current: Decimal) -> Option<ChangePct> {
    let previous = previous?;

    if previous > Decimal::ZERO {
        let pct = (current - previous)
            .checked_div(previous)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            // Ratio past Decimal range: saturate instead of panicking
            .unwrap_or(if current >= previous { Decimal::MAX } else { Decimal::MIN });
        Some(ChangePct::Percent(pct.normalize()))
    } else if current > Decimal::ZERO {
        Some(ChangePct::NewBalance)
    } else {
        None
    }
}

/// Convenience wrapper using the default threshold
pub fn compute_changes(current: &[HolderRecord], previous: &Snapshot) -> Vec<ChangeResult> {
    ChangeEngine::with_defaults().compute_changes(current, previous)
}
