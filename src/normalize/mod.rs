// src/normalize/mod.rs

pub mod date;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::ingest::RawGrid;

/// Delimiter joining header tokens into a canonical column name.
pub const DELIMITER: char = '_';

/// Marker cell carrying no semantic content of its own; its column
/// inherits the most recently seen price-type prefix.
pub const UNLABELED_MARKER: &str = "undefined";

/// Keywords whose presence in a row marks it as a header row.
const HEADER_KEYWORDS: [&str; 8] = [
    "代码",
    "名称",
    "收盘价",
    "开盘价",
    "5日均线",
    "均线",
    "财务诊断评分",
    UNLABELED_MARKER,
];

/// Price-type prefixes recognized on the first header token of a column,
/// in match priority order.
const PRICE_TYPE_PREFIXES: [(&str, &str); 5] = [
    ("收盘价", "收盘价"),
    ("5日均线", "5日均线"),
    ("均线", "5日均线"),
    ("开盘价", "开盘价"),
    ("财务诊断评分", "财务诊断评分"),
];

/// How many leading rows are inspected when locating the header.
const HEADER_SCAN_DEPTH: usize = 5;

static YEAR_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(19|20)\d{2}").expect("year regex"));

/// Header rows consumed plus the canonical column sequence, one name per
/// grid column. Data rows follow separately.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedHeader {
    pub span: usize,
    pub columns: Vec<String>,
    pub data_rows: Vec<Vec<String>>,
}

/// True when `text` looks like the second line of a split header: a year
/// token or a technical-indicator keyword.
fn contains_date_or_technical(text: &str) -> bool {
    let lower = text.to_lowercase();
    if YEAR_TOKEN.is_match(&lower) {
        return true;
    }
    ["收盘价", "开盘价", "均线", "ma", UNLABELED_MARKER, "前", "后"]
        .iter()
        .any(|k| lower.contains(k))
}

fn row_text(row: &[String]) -> String {
    row.iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Detect how many rows the header spans. Keywords in row 0 with
/// date-or-technical text in row 1 → 2; keywords first appearing at row
/// i > 0 → i + 1; no keywords in the scan window → 1 (fallback).
pub fn detect_header_span(grid: &RawGrid) -> usize {
    for (i, row) in grid.rows.iter().take(HEADER_SCAN_DEPTH).enumerate() {
        let text = row_text(row);
        if HEADER_KEYWORDS.iter().any(|k| text.contains(k)) {
            if i == 0 {
                if let Some(next) = grid.rows.get(1) {
                    if contains_date_or_technical(&row_text(next)) {
                        return 2;
                    }
                }
                return 1;
            }
            return i + 1;
        }
    }
    1
}

/// Fill blank cells with the nearest preceding non-blank cell in the row.
fn forward_fill(row: &[String], width: usize) -> Vec<String> {
    let mut filled = Vec::with_capacity(width);
    let mut last = String::new();
    for i in 0..width {
        let cell = row.get(i).map(|s| s.trim()).unwrap_or("");
        if !cell.is_empty() {
            last = cell.to_string();
        }
        filled.push(last.clone());
    }
    filled
}

/// Normalize the grid's header into one canonical column sequence.
///
/// For multi-row headers each header row is forward-filled, then columns
/// are walked left to right carrying a `current_prefix` updated whenever
/// the first header token matches a price-type keyword. A column whose
/// first token is the unlabeled marker is named
/// `current_prefix + '_' + last_header_token`; any other column joins its
/// non-empty tokens with `'_'`. A column with no tokens at all yields the
/// empty string (dropped later by the cleaner).
///
/// Pure: the same grid always yields the same column sequence.
pub fn normalize_headers(grid: &RawGrid) -> NormalizedHeader {
    let span = detect_header_span(grid);
    let width = grid.width;

    if span == 1 {
        let columns = (0..width)
            .map(|i| {
                grid.rows
                    .first()
                    .and_then(|r| r.get(i))
                    .map(|s| s.trim().to_string())
                    .unwrap_or_default()
            })
            .collect();
        let data_rows = grid.rows.iter().skip(1).cloned().collect();
        return NormalizedHeader {
            span,
            columns,
            data_rows,
        };
    }

    let header_rows: Vec<Vec<String>> = grid
        .rows
        .iter()
        .take(span)
        .map(|r| forward_fill(r, width))
        .collect();

    let mut columns = Vec::with_capacity(width);
    let mut current_prefix = String::new();

    for col in 0..width {
        let tokens: Vec<&str> = header_rows
            .iter()
            .map(|r| r[col].as_str())
            .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("nan"))
            .collect();

        if tokens.is_empty() {
            columns.push(String::new());
            continue;
        }

        for (keyword, prefix) in PRICE_TYPE_PREFIXES {
            if tokens[0].contains(keyword) {
                current_prefix = prefix.to_string();
                break;
            }
        }

        let date_part = if tokens.len() > 1 {
            tokens[tokens.len() - 1]
        } else {
            tokens[0]
        };

        let name = if !current_prefix.is_empty() && tokens[0].contains(UNLABELED_MARKER) {
            format!("{}{}{}", current_prefix, DELIMITER, date_part)
        } else {
            tokens
                .join(&DELIMITER.to_string())
                .trim_matches(DELIMITER)
                .to_string()
        };
        columns.push(name);
    }

    debug!(span, columns = ?columns, "normalized header");

    NormalizedHeader {
        span,
        columns,
        data_rows: grid.rows.iter().skip(span).cloned().collect(),
    }
}
