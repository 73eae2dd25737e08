//! Core data types for the holder ranking pipeline
//!
//! - `RawHolder` is what a source provider hands back (unranked)
//! - `HolderRecord` is the canonical ranked entry, and the persisted shape
//! - `ChangeResult` is a `HolderRecord` enriched with change metrics
//! - `Snapshot` is the persisted mapping keyed by lowercase address

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Holder row as returned by a source provider, before normalization and ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHolder {
    pub address: String,
    pub label: Option<String>,
    pub balance: Decimal,
    pub source: String,
}

/// One ranked entry of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderRecord {
    /// Address with its original casing (display form)
    pub address: String,
    pub balance: Decimal,
    #[serde(default)]
    pub label: Option<String>,
    pub source: String,
    pub rank: u32,
}

impl HolderRecord {
    /// Case-insensitive identity used for keying and comparison
    pub fn key(&self) -> String {
        normalize_address(&self.address)
    }
}

/// Lowercase form of an address used as snapshot key
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Balance change relative to the previous snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangePct {
    /// Finite signed percentage
    Percent(Decimal),
    /// Previous balance was exactly zero and current is positive
    NewBalance,
}

/// `HolderRecord` enriched with change metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeResult {
    pub record: HolderRecord,
    /// `None` when there is no prior data to compare against
    pub change_pct: Option<ChangePct>,
    pub flag: bool,
}

impl ChangeResult {
    pub fn address(&self) -> &str {
        &self.record.address
    }

    pub fn balance(&self) -> Decimal {
        self.record.balance
    }

    pub fn rank(&self) -> u32 {
        self.record.rank
    }

    /// Finite percentage, if any
    pub fn percent(&self) -> Option<Decimal> {
        match self.change_pct {
            Some(ChangePct::Percent(pct)) => Some(pct),
            _ => None,
        }
    }

    pub fn is_new_balance(&self) -> bool {
        matches!(self.change_pct, Some(ChangePct::NewBalance))
    }
}

/// Last-known holder records keyed by lowercase address
pub type Snapshot = BTreeMap<String, HolderRecord>;

/// Build a snapshot from an ordered record list
///
/// Later occurrences of the same address overwrite earlier ones.
pub fn snapshot_from_records(records: &[HolderRecord]) -> Snapshot {
    records
        .iter()
        .map(|record| (record.key(), record.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(address: &str, balance: i64, rank: u32) -> HolderRecord {
        HolderRecord {
            address: address.to_string(),
            balance: Decimal::from(balance),
            label: None,
            source: "test".to_string(),
            rank,
        }
    }

    #[test]
    fn test_key_is_case_insensitive() {
        let upper = record("0xABCdef", 1, 1);
        let lower = record("0xabcdef", 1, 1);
        assert_eq!(upper.key(), lower.key());
        assert_eq!(upper.address, "0xABCdef");
    }

    #[test]
    fn test_snapshot_keys_are_lowercase() {
        let snapshot = snapshot_from_records(&[record("0xAA", 10, 1), record("0xBb", 5, 2)]);

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains_key("0xaa"));
        assert!(snapshot.contains_key("0xbb"));
        assert_eq!(snapshot["0xaa"].address, "0xAA");
    }

    #[test]
    fn test_balance_serializes_as_exact_string() {
        let mut rec = record("0x1", 0, 1);
        rec.balance = "1234567.123456789012345678".parse().unwrap();

        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"1234567.123456789012345678\""));

        let back: HolderRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }
}
