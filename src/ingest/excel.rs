// src/ingest/excel.rs

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use super::RawGrid;

/// Read the first worksheet of a spreadsheet into a RawGrid, every cell
/// stringified. Workbook format (xls/xlsx) is auto-detected from content.
pub fn read_excel_grid(path: &Path) -> Result<RawGrid> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening workbook {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("workbook {} has no worksheets", path.display()))?
        .with_context(|| format!("reading first worksheet of {}", path.display()))?;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    debug!(rows = rows.len(), "read spreadsheet grid");
    Ok(RawGrid::new(rows))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Error(_) => String::new(),
        other => other.to_string(),
    }
}
