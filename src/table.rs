// src/table.rs

use serde::Serialize;

/// A single cleaned cell. `Number` vs `Text` is the explicit outcome of
/// numeric coercion; `Null` is what sentinels and blanks scrub down to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    Null,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric view of the cell. `Text` never converts here; coercion is
    /// the cleaner's job and has already happened by the time anyone asks.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render for serialization: `Null` is the empty field.
    pub fn to_field(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Number(v) => {
                // Integral prices come back out without a trailing ".0".
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    format!("{}", *v as i64)
                } else {
                    format!("{}", v)
                }
            }
            Cell::Text(s) => s.clone(),
        }
    }
}

/// Row-per-entity table with canonical column names. Column names are not
/// required to be unique; consumers that care address columns by position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl EntityTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    /// Position of the first column with this exact name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at (row, col); out-of-range reads as `Null` so short rows
    /// behave like padded ones.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static NULL: Cell = Cell::Null;
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(&NULL)
    }

    /// All numeric values in one column, nulls and text skipped.
    pub fn numeric_column(&self, col: usize) -> Vec<f64> {
        self.rows
            .iter()
            .filter_map(|r| r.get(col).and_then(Cell::as_number))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_field_rendering() {
        assert_eq!(Cell::Null.to_field(), "");
        assert_eq!(Cell::Number(12.0).to_field(), "12");
        assert_eq!(Cell::Number(12.5).to_field(), "12.5");
        assert_eq!(Cell::Text("平安银行".into()).to_field(), "平安银行");
    }

    #[test]
    fn out_of_range_cell_is_null() {
        let t = EntityTable::new(
            vec!["a".into(), "b".into()],
            vec![vec![Cell::Number(1.0)]],
        );
        assert!(t.cell(0, 1).is_null());
        assert!(t.cell(5, 0).is_null());
    }

    #[test]
    fn numeric_column_skips_text_and_null() {
        let t = EntityTable::new(
            vec!["p".into()],
            vec![
                vec![Cell::Number(10.0)],
                vec![Cell::Text("停牌".into())],
                vec![Cell::Null],
                vec![Cell::Number(11.5)],
            ],
        );
        assert_eq!(t.numeric_column(0), vec![10.0, 11.5]);
    }
}
