// src/clean/resolve.rs
//
// Best-effort identification of the entity code and name columns. This is
// keyword matching against whatever the header normalizer produced, not a
// guarantee; first match wins and unresolved identifiers fall back to
// positional values.

use tracing::debug;

use crate::table::{Cell, EntityTable};

/// Canonical label for the resolved code column.
pub const CODE_COLUMN: &str = "股票代码";
/// Canonical label for the resolved name column.
pub const NAME_COLUMN: &str = "股票名称";

const CODE_KEYWORDS: [&str; 3] = ["代码", "code", "symbol"];
const NAME_KEYWORDS: [&str; 4] = ["名称", "name", "股票名称", "股票简称"];

/// One resolution rule: keyword set to scan for, canonical label to
/// assign to the first hit. Evaluated in declaration order so the
/// resolution is auditable.
struct Rule {
    keywords: &'static [&'static str],
    label: &'static str,
}

const RULES: [Rule; 2] = [
    Rule {
        keywords: &CODE_KEYWORDS,
        label: CODE_COLUMN,
    },
    Rule {
        keywords: &NAME_KEYWORDS,
        label: NAME_COLUMN,
    },
];

fn matches_any(column: &str, keywords: &[&str]) -> bool {
    let lower = column.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Rename the first column matching each rule to its canonical label.
/// Missing matches are left alone; lookups then fall back positionally.
pub fn resolve_identifier_columns(table: &mut EntityTable) {
    for rule in &RULES {
        if let Some(idx) = table
            .columns
            .iter()
            .position(|c| matches_any(c, rule.keywords))
        {
            if table.columns[idx] != rule.label {
                debug!(from = %table.columns[idx], to = rule.label, "resolved identifier column");
                table.columns[idx] = rule.label.to_string();
            }
        }
    }
}

fn lookup(table: &EntityTable, row: usize, keywords: &[&str]) -> Option<String> {
    let idx = table
        .columns
        .iter()
        .position(|c| matches_any(c, keywords))?;
    match table.cell(row, idx) {
        Cell::Null => None,
        cell => Some(cell.to_field()),
    }
}

/// Entity code for a row, or the positional fallback `代码<row>` when no
/// code column resolves or the cell is null. Fallback keys are not stable
/// across snapshots.
pub fn entity_code(table: &EntityTable, row: usize) -> String {
    lookup(table, row, &CODE_KEYWORDS).unwrap_or_else(|| format!("代码{row}"))
}

/// Entity display name for a row, or the positional fallback `股票<row>`.
pub fn entity_name(table: &EntityTable, row: usize) -> String {
    lookup(table, row, &NAME_KEYWORDS).unwrap_or_else(|| format!("股票{row}"))
}

/// Cross-snapshot identity for a row: `"{code} {name}"` trimmed, plus
/// whether a positional fallback was substituted (degraded identity).
pub fn entity_key(table: &EntityTable, row: usize) -> (String, bool) {
    let code = lookup(table, row, &CODE_KEYWORDS);
    let name = lookup(table, row, &NAME_KEYWORDS);
    let degraded = code.is_none() || name.is_none();
    let code = code.unwrap_or_else(|| format!("代码{row}"));
    let name = name.unwrap_or_else(|| format!("股票{row}"));
    (format!("{code} {name}").trim().to_string(), degraded)
}
