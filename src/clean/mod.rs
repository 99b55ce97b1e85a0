// src/clean/mod.rs

pub mod resolve;

use tracing::debug;

use crate::table::{Cell, EntityTable};

/// Tokens scrubbed to null wherever they appear in the table.
const SENTINELS: [&str; 8] = ["-", "—", "空值", "null", "None", "", "NaN", "--"];

/// Outcome of numeric coercion on a cleaned text value.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Numeric(f64),
    Text(String),
}

/// Strip thousands separators and internal spaces, then attempt numeric
/// coercion. Failure is not an error: the caller gets the cleaned text
/// back and decides what to do with it.
pub fn coerce_numeric(text: &str) -> Coerced {
    let stripped: String = text.replace(',', "").replace(' ', "");
    match stripped.parse::<f64>() {
        Ok(v) if v.is_finite() => Coerced::Numeric(v),
        // "nan"/"inf" literals parse but carry no usable value.
        _ => Coerced::Text(stripped),
    }
}

/// Scrub one raw text value down to a typed cell: trim, null out
/// sentinels, strip separators, coerce.
pub fn clean_text(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("nan") || SENTINELS.contains(&trimmed) {
        return Cell::Null;
    }
    match coerce_numeric(trimmed) {
        Coerced::Numeric(v) => Cell::Number(v),
        Coerced::Text(s) => {
            // Separator stripping may itself expose a sentinel ("- -" →
            // "--"); nulling it here keeps cleaning idempotent.
            if s.is_empty() || s.eq_ignore_ascii_case("nan") || SENTINELS.contains(&s.as_str()) {
                Cell::Null
            } else {
                Cell::Text(s)
            }
        }
    }
}

fn clean_cell(cell: &Cell) -> Cell {
    match cell {
        Cell::Text(s) => clean_text(s),
        other => other.clone(),
    }
}

/// Wrap untyped data rows under canonical column names, padding short
/// rows to the header width. All cells start as raw text.
pub fn raw_table(columns: Vec<String>, data_rows: Vec<Vec<String>>) -> EntityTable {
    let width = columns.len();
    let rows = data_rows
        .into_iter()
        .map(|mut r| {
            r.resize(width, String::new());
            r.into_iter().map(Cell::Text).collect()
        })
        .collect();
    EntityTable::new(columns, rows)
}

/// Clean a table in the fixed order: normalize text cells and scrub
/// sentinels, coerce numerics, drop all-null rows, drop all-null columns,
/// resolve identifier columns. Idempotent: cleaning clean output is a
/// no-op.
pub fn clean_table(table: EntityTable) -> EntityTable {
    let EntityTable { columns, rows } = table;

    // 1-3) per-cell scrub and coercion
    let mut rows: Vec<Vec<Cell>> = rows
        .into_iter()
        .map(|r| r.iter().map(clean_cell).collect())
        .collect();

    // 4) drop rows that are entirely null
    let before_rows = rows.len();
    rows.retain(|r| r.iter().any(|c| !c.is_null()));
    if rows.len() < before_rows {
        debug!(dropped = before_rows - rows.len(), "dropped all-null rows");
    }

    // 5) drop columns that are entirely null
    let keep: Vec<bool> = (0..columns.len())
        .map(|i| rows.iter().any(|r| r.get(i).map_or(false, |c| !c.is_null())))
        .collect();
    let dropped_cols = keep.iter().filter(|k| !**k).count();
    if dropped_cols > 0 {
        debug!(dropped = dropped_cols, "dropped all-null columns");
    }
    let columns: Vec<String> = columns
        .into_iter()
        .zip(&keep)
        .filter_map(|(c, k)| k.then_some(c))
        .collect();
    let rows: Vec<Vec<Cell>> = rows
        .into_iter()
        .map(|r| {
            r.into_iter()
                .zip(&keep)
                .filter_map(|(c, k)| k.then_some(c))
                .collect()
        })
        .collect();

    // 6) identifier columns
    let mut table = EntityTable::new(columns, rows);
    resolve::resolve_identifier_columns(&mut table);
    table
}
