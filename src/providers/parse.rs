//! Tolerant parsing of holder feeds
//!
//! Accepted document shapes:
//! - bare array: `[{...}, ...]`
//! - `{"holders": [{...}, ...]}`
//! - `{"data": [{"holderList": [{...}, ...]}]}`
//!
//! Row fields: `address`; `balance` or `balance_eth` (string or number,
//! thousands separators and a trailing unit like `" ETH"` allowed);
//! `label`, `name_tag` or `tag`. Rows that do not parse are dropped.

use crate::pipeline::types::RawHolder;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use super::ProviderError;

/// Parse a balance string such as `"1,234.5 ETH"`
pub fn parse_balance_str(text: &str) -> Option<Decimal> {
    let number = text.trim().split_whitespace().next()?.replace(',', "");
    if number.is_empty() {
        return None;
    }

    Decimal::from_str(&number)
        .or_else(|_| Decimal::from_scientific(&number))
        .ok()
}

fn parse_balance(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => parse_balance_str(s),
        Value::Number(n) => parse_balance_str(&n.to_string()),
        _ => None,
    }
}

fn first_string(row: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| row.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse one row, `None` if it is unusable
pub fn parse_row(row: &Value, source: &str) -> Option<RawHolder> {
    let address = first_string(row, &["address"])?;
    let balance = ["balance", "balance_eth"]
        .iter()
        .find_map(|key| row.get(*key).and_then(parse_balance))?;
    let label = first_string(row, &["label", "name_tag", "tag"]);

    Some(RawHolder {
        address,
        label,
        balance,
        source: source.to_string(),
    })
}

fn holder_rows(document: &Value) -> Option<&Vec<Value>> {
    if let Some(rows) = document.as_array() {
        return Some(rows);
    }

    if let Some(rows) = document.get("holders").and_then(Value::as_array) {
        return Some(rows);
    }

    document
        .get("data")
        .and_then(Value::as_array)
        .and_then(|data| data.first())
        .and_then(|first| first.get("holderList"))
        .and_then(Value::as_array)
}

/// Parse a whole feed document
///
/// An unrecognised document shape is a parse error; bad rows are not.
pub fn parse_document(document: &Value, source: &str) -> Result<Vec<RawHolder>, ProviderError> {
    let rows = holder_rows(document)
        .ok_or_else(|| ProviderError::Parse("no holder list in document".to_string()))?;

    let holders: Vec<RawHolder> = rows
        .iter()
        .filter_map(|row| {
            let parsed = parse_row(row, source);
            if parsed.is_none() {
                log::debug!("Dropping unparseable holder row from {}: {}", source, row);
            }
            parsed
        })
        .collect();

    if holders.len() < rows.len() {
        log::debug!(
            "Parsed {}/{} holder rows from {}",
            holders.len(),
            rows.len(),
            source
        );
    }

    Ok(holders)
}
