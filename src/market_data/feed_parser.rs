//! Parser for the tab-delimited live-rate feed.
//!
//! Rows are newline separated, columns tab separated. Some rows carry a
//! leading empty column and some do not, so the data offset is decided per
//! row. After the offset the columns are
//! `id, name, bid, ask, high, low, stock`.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::debug;

use crate::market_data::types::{ProductRecord, Quote, RateRecord, RateSnapshot, UNAVAILABLE};

/// Stock token value that marks an instrument as available.
pub const IN_STOCK_MARKER: &str = "InStock";

/// Spot composition, in display order: gold ($), silver ($), USD-INR.
pub const SPOT_IDS: [&str; 3] = ["3101", "3107", "3103"];

/// Product composition: Gold 999, Silver 999 (30 kg), Silver 999 (5 kg).
pub const PRODUCT_IDS: [&str; 3] = ["945", "2966", "2987"];

/// Columns up to and including `ask` must exist for a row to be admitted.
const REQUIRED_COLUMNS: usize = 4;

/// Result of parsing one payload, with bookkeeping about dropped rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReport {
    pub snapshot: RateSnapshot,
    pub rejected_rows: usize,
}

/// Parses a raw feed payload into a snapshot, silently dropping bad rows.
pub fn parse(raw: &str) -> RateSnapshot {
    parse_with_report(raw).snapshot
}

pub fn parse_with_report(raw: &str) -> ParseReport {
    let mut by_id: HashMap<String, RateRecord> = HashMap::new();
    let mut rejected_rows = 0;

    for (line_no, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(line) {
            Some(record) => {
                by_id.insert(record.id.clone(), record);
            }
            None => {
                rejected_rows += 1;
                debug!(line_no, "dropping feed row without id, name or ask");
            }
        }
    }

    let spot = SPOT_IDS
        .iter()
        .filter_map(|id| by_id.get(*id).cloned())
        .collect();
    let rtgs = PRODUCT_IDS
        .iter()
        .filter_map(|id| by_id.get(*id).map(ProductRecord::from))
        .collect();

    ParseReport {
        snapshot: RateSnapshot {
            spot,
            rtgs,
            futures: Vec::new(),
            next: Vec::new(),
        },
        rejected_rows,
    }
}

fn parse_row(line: &str) -> Option<RateRecord> {
    let cols: Vec<&str> = line.split('\t').map(str::trim).collect();
    let offset = usize::from(cols.first().is_some_and(|first| first.is_empty()));
    let fields = cols.get(offset..)?;

    if fields.len() < REQUIRED_COLUMNS {
        return None;
    }
    let (id, name) = (fields[0], fields[1]);
    if id.is_empty() || name.is_empty() {
        return None;
    }

    let field = |index: usize| fields.get(index).copied().unwrap_or("");

    Some(RateRecord {
        id: id.to_string(),
        name: name.to_string(),
        bid: parse_quote(field(2)),
        ask: parse_quote(field(3)),
        high: parse_quote(field(4)),
        low: parse_quote(field(5)),
        in_stock: field(6) == IN_STOCK_MARKER,
    })
}

/// `-` is the sentinel; anything that is not a decimal is treated the same.
fn parse_quote(token: &str) -> Quote {
    if token == UNAVAILABLE || token.is_empty() {
        return Quote::Unavailable;
    }
    Decimal::from_str(token)
        .or_else(|_| Decimal::from_scientific(token))
        .map(Quote::Price)
        .unwrap_or(Quote::Unavailable)
}
