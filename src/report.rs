//! Plain-text rendering of a pipeline report
//!
//! Each holder becomes one two-line entry:
//!
//! ```text
//!   1. 0x00000000219ab540356cBB839Cbe05303d7705Fa — Beacon Deposit Contract
//!      61,234,567.0000 ETH • src:oklink (+0.3%)
//! ```
//!
//! Entries are packed into chunks of at most `max_chars` characters (before
//! the `Part i/n` footer). An entry is never split across chunks.

use crate::pipeline::types::{ChangePct, ChangeResult};
use crate::pipeline::{Persistence, Report};
use rust_decimal::Decimal;

pub const DEFAULT_MAX_CHARS: usize = 3800;

pub const NOT_SAVED_WARNING: &str =
    "⚠️ Results shown, but not saved for future comparison.";

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub max_chars: usize,
    pub asset_symbol: String,
    pub top_n: usize,
    pub flag_threshold_pct: Decimal,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            asset_symbol: "ETH".to_string(),
            top_n: 100,
            flag_threshold_pct: Decimal::from(50),
        }
    }
}

impl ReportOptions {
    /// Swing magnitude, matching how the engine compares it
    fn threshold(&self) -> Decimal {
        self.flag_threshold_pct.abs().normalize()
    }

    fn header(&self) -> String {
        format!(
            "{} — Top {} richest addresses\nMarked with ⚠️ if balance changed {}%+ since last check.",
            self.asset_symbol,
            self.top_n,
            self.threshold()
        )
    }
}

/// Group the integer part of a decimal string with commas
fn group_thousands(formatted: &str) -> String {
    let (sign, digits) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Balance with 4 decimals and thousands separators
pub fn format_balance(balance: Decimal) -> String {
    group_thousands(&format!("{:.4}", balance.round_dp(4)))
}

/// Change column: ` (new)`, ` (new balance)` or ` (+12.3%)`
pub fn format_change(change_pct: Option<ChangePct>) -> String {
    match change_pct {
        None => " (new)".to_string(),
        Some(ChangePct::NewBalance) => " (new balance)".to_string(),
        Some(ChangePct::Percent(pct)) => {
            let rounded = pct.round_dp(1);
            if rounded < Decimal::ZERO {
                format!(" ({:.1}%)", rounded)
            } else {
                format!(" (+{:.1}%)", rounded.abs())
            }
        }
    }
}

/// One holder entry (two lines, no trailing newline)
pub fn format_entry(result: &ChangeResult, options: &ReportOptions) -> String {
    let record = &result.record;
    let label = record
        .label
        .as_deref()
        .map(|label| format!(" — {}", label))
        .unwrap_or_default();
    let flag = if result.flag {
        format!(" ⚠️{}%+", options.threshold())
    } else {
        String::new()
    };

    format!(
        "{:>3}. {}{}\n     {} {} • src:{}{}{}",
        record.rank,
        record.address,
        label,
        format_balance(record.balance),
        options.asset_symbol,
        record.source,
        format_change(result.change_pct),
        flag
    )
}

/// Pack header and entries into chunks of at most `max_chars` characters
///
/// Entries are joined with a newline. An entry that alone exceeds the
/// limit gets a chunk of its own.
pub fn chunk_entries(header: &str, entries: &[String], max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = header.to_string();
    let mut current_len = current.chars().count();

    for entry in entries {
        let entry_len = entry.chars().count();
        let needed = if current.is_empty() { entry_len } else { current_len + 1 + entry_len };

        if needed > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(entry);
        current_len += entry_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Render a full report into transport-sized messages
pub fn render_report(report: &Report, options: &ReportOptions) -> Vec<String> {
    if report.is_empty() {
        return vec![format!(
            "{}\n\nNo holder data available right now: every source failed or returned nothing. Previous snapshot kept.",
            options.header()
        )];
    }

    let entries: Vec<String> = report
        .results
        .iter()
        .map(|result| format_entry(result, options))
        .collect();

    let mut chunks = chunk_entries(&options.header(), &entries, options.max_chars);

    if let Persistence::Failed(_) = report.persistence {
        let warning_len = NOT_SAVED_WARNING.chars().count() + 2;
        match chunks.last_mut() {
            Some(last) if last.chars().count() + warning_len <= options.max_chars => {
                last.push_str("\n\n");
                last.push_str(NOT_SAVED_WARNING);
            }
            _ => chunks.push(NOT_SAVED_WARNING.to_string()),
        }
    }

    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(idx, chunk)| format!("{}\n\nPart {}/{}", chunk, idx + 1, total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::HolderRecord;

    fn result(rank: u32, balance: &str, change_pct: Option<ChangePct>, flag: bool) -> ChangeResult {
        ChangeResult {
            record: HolderRecord {
                address: format!("0x{:040X}", rank),
                balance: balance.parse().unwrap(),
                label: if rank == 1 { Some("Binance 7".to_string()) } else { None },
                source: "oklink".to_string(),
                rank,
            },
            change_pct,
            flag,
        }
    }

    fn report(results: Vec<ChangeResult>, persistence: Persistence) -> Report {
        Report {
            results,
            source: Some("oklink".to_string()),
            persistence,
        }
    }

    #[test]
    fn test_format_balance() {
        assert_eq!(format_balance("1996008.377108762938287621".parse().unwrap()), "1,996,008.3771");
        assert_eq!(format_balance("999".parse().unwrap()), "999.0000");
        assert_eq!(format_balance("1000".parse().unwrap()), "1,000.0000");
        assert_eq!(format_balance(Decimal::ZERO), "0.0000");
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(None), " (new)");
        assert_eq!(format_change(Some(ChangePct::NewBalance)), " (new balance)");
        assert_eq!(format_change(Some(ChangePct::Percent("60".parse().unwrap()))), " (+60.0%)");
        assert_eq!(format_change(Some(ChangePct::Percent("-12.345".parse().unwrap()))), " (-12.3%)");
        assert_eq!(format_change(Some(ChangePct::Percent(Decimal::ZERO))), " (+0.0%)");
    }

    #[test]
    fn test_format_entry() {
        let entry = format_entry(&result(1, "160", Some(ChangePct::Percent("60".parse().unwrap())), true), &ReportOptions::default());

        assert_eq!(
            entry,
            format!(
                "  1. 0x{:040X} — Binance 7\n     160.0000 ETH • src:oklink (+60.0%) ⚠️50%+",
                1
            )
        );
    }

    #[test]
    fn test_negative_threshold_shown_as_magnitude() {
        let options = ReportOptions {
            flag_threshold_pct: "-50.0".parse().unwrap(),
            ..ReportOptions::default()
        };

        let entry = format_entry(&result(2, "160", Some(ChangePct::Percent("-60".parse().unwrap())), true), &options);
        assert!(entry.ends_with("(-60.0%) ⚠️50%+"));
        assert!(options.header().contains("changed 50%+"));
    }

    #[test]
    fn test_chunks_never_split_entries() {
        let entries: Vec<String> = (1..=100)
            .map(|rank| format_entry(&result(rank, "12345.6789", None, false), &ReportOptions::default()))
            .collect();

        let chunks = chunk_entries("header", &entries, 500);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 500);
        }
        let rejoined = chunks.join("\n");
        assert_eq!(rejoined, format!("header\n{}", entries.join("\n")));
        for entry in &entries {
            assert!(chunks.iter().any(|chunk| chunk.contains(entry.as_str())));
        }
    }

    #[test]
    fn test_chunk_boundary_exact_fit() {
        let entries = vec!["aaaa".to_string(), "bbbb".to_string()];

        // "h\naaaa\nbbbb" is exactly 11 characters
        assert_eq!(chunk_entries("h", &entries, 11), vec!["h\naaaa\nbbbb"]);
        assert_eq!(chunk_entries("h", &entries, 10), vec!["h\naaaa", "bbbb"]);
    }

    #[test]
    fn test_oversized_entry_gets_own_chunk() {
        let entries = vec!["short".to_string(), "x".repeat(50), "tail".to_string()];
        let chunks = chunk_entries("h", &entries, 20);

        assert_eq!(chunks, vec!["h\nshort".to_string(), "x".repeat(50), "tail".to_string()]);
    }

    #[test]
    fn test_render_adds_part_footer() {
        let results: Vec<ChangeResult> = (1..=100).map(|rank| result(rank, "1000", None, false)).collect();
        let chunks = render_report(&report(results, Persistence::Saved), &ReportOptions::default());

        let total = chunks.len();
        assert!(total > 1);
        assert!(chunks[0].starts_with("ETH — Top 100 richest addresses"));
        for (idx, chunk) in chunks.iter().enumerate() {
            assert!(chunk.ends_with(&format!("Part {}/{}", idx + 1, total)));
        }
    }

    #[test]
    fn test_render_empty_report() {
        let chunks = render_report(&report(Vec::new(), Persistence::SkippedEmpty), &ReportOptions::default());

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("No holder data available"));
    }

    #[test]
    fn test_render_warns_when_not_saved() {
        let results = vec![result(1, "10", None, false)];
        let chunks = render_report(
            &report(results, Persistence::Failed("disk full".to_string())),
            &ReportOptions::default(),
        );

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains(NOT_SAVED_WARNING));
    }
}
