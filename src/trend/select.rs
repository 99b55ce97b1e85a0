// src/trend/select.rs

use tracing::debug;

use crate::normalize::date::{parse_date_token, ParsedDate};
use crate::normalize::DELIMITER;
use crate::table::EntityTable;

/// How many closing-price observations a snapshot contributes at most.
pub const RECENT_WINDOW: usize = 7;

/// Plausibility bound on a candidate column's numeric mean. Score and
/// percentage columns share header vocabulary with prices; their means
/// fall outside this band.
const PRICE_MEAN_RANGE: (f64, f64) = (0.1, 10_000.0);

/// A column selected as a closing-price observation, with the date token
/// extracted from its name (ISO-formatted when it parsed, raw otherwise).
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedColumn {
    pub index: usize,
    pub name: String,
    pub date: String,
}

/// True for names that denote closing price and not one of the
/// similarly-worded technical columns.
fn is_closing_name(name: &str) -> bool {
    if name.starts_with("收盘价_") {
        return true;
    }
    name.contains("收盘价") && !name.contains("开盘价") && !name.contains("5日均线")
}

/// Trailing date token of a canonical column name: last delimiter
/// segment, any bracketed suffix discarded. Parsed dates are normalized
/// to ISO form; unparseable tokens pass through as-is.
fn extract_date(name: &str) -> String {
    let parts: Vec<&str> = name.split(DELIMITER).collect();
    if parts.len() < 2 {
        return name.to_string();
    }
    let raw = parts[parts.len() - 1]
        .split(" [")
        .next()
        .unwrap_or("")
        .trim();
    match parse_date_token(raw) {
        ParsedDate::Parsed(d) => d.format("%Y-%m-%d").to_string(),
        ParsedDate::Unparseable(s) => s,
    }
}

/// A plausible price series has at least one numeric value and a numeric
/// mean inside the price band.
fn is_plausible_price_column(table: &EntityTable, col: usize) -> bool {
    let values = table.numeric_column(col);
    if values.is_empty() {
        return false;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (PRICE_MEAN_RANGE.0..=PRICE_MEAN_RANGE.1).contains(&mean)
}

/// Select closing-price columns, ordered ascending by parsed date
/// (unparseable dates first via the far-past sentinel), capped to the
/// most recent [`RECENT_WINDOW`].
pub fn closing_price_columns(table: &EntityTable) -> Vec<SelectedColumn> {
    let mut picked: Vec<SelectedColumn> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| is_closing_name(name))
        .filter(|(i, _)| is_plausible_price_column(table, *i))
        .map(|(index, name)| SelectedColumn {
            index,
            name: name.clone(),
            date: extract_date(name),
        })
        .collect();

    picked.sort_by_key(|c| parse_date_token(&c.date).sort_key());
    if picked.len() > RECENT_WINDOW {
        picked.drain(..picked.len() - RECENT_WINDOW);
    }

    debug!(
        columns = ?picked.iter().map(|c| &c.name).collect::<Vec<_>>(),
        "selected closing-price columns"
    );
    picked
}
