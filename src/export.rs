// src/export.rs
//
// Serialization of a cleaned EntityTable for the export collaborator.
// Column order and row order are preserved; null cells serialize as
// empty fields.

use anyhow::{anyhow, Context, Result};
use rust_xlsxwriter::Workbook;

use crate::table::{Cell, EntityTable};

/// Render the table as UTF-8 CSV text: one header row, then the data
/// rows in table order.
pub fn table_to_csv(table: &EntityTable) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&table.columns)
        .context("writing csv header")?;
    for (idx, row) in table.rows.iter().enumerate() {
        let fields: Vec<String> = (0..table.column_count())
            .map(|col| row.get(col).map(Cell::to_field).unwrap_or_default())
            .collect();
        writer
            .write_record(&fields)
            .with_context(|| format!("writing csv row {idx}"))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("flushing csv writer: {e}"))?;
    String::from_utf8(bytes).context("csv output was not utf-8")
}

/// Render the table as a spreadsheet binary (xlsx). Numbers stay
/// numbers, text stays text, nulls stay blank.
pub fn table_to_xlsx(table: &EntityTable) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, name) in table.columns.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, name)
            .with_context(|| format!("writing header cell {col}"))?;
    }
    for (row, cells) in table.rows.iter().enumerate() {
        let out_row = (row + 1) as u32;
        for (col, cell) in cells.iter().enumerate() {
            match cell {
                Cell::Null => {}
                Cell::Number(v) => {
                    worksheet
                        .write_number(out_row, col as u16, *v)
                        .with_context(|| format!("writing cell ({row}, {col})"))?;
                }
                Cell::Text(s) => {
                    worksheet
                        .write_string(out_row, col as u16, s)
                        .with_context(|| format!("writing cell ({row}, {col})"))?;
                }
            }
        }
    }

    workbook
        .save_to_buffer()
        .context("serializing xlsx workbook")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::{clean_table, raw_table};
    use crate::ingest::parse_csv_text;
    use crate::normalize::normalize_headers;

    fn sample_table() -> EntityTable {
        EntityTable::new(
            vec![
                "股票代码".into(),
                "股票名称".into(),
                "收盘价_2025-11-12".into(),
            ],
            vec![
                vec![
                    Cell::Text("000001.SZ".into()),
                    Cell::Text("平安银行".into()),
                    Cell::Number(11.5),
                ],
                vec![
                    Cell::Text("600000.SH".into()),
                    Cell::Text("浦发银行".into()),
                    Cell::Null,
                ],
            ],
        )
    }

    #[test]
    fn csv_preserves_order_and_blanks_nulls() {
        let text = table_to_csv(&sample_table()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "股票代码,股票名称,收盘价_2025-11-12");
        assert_eq!(lines.next().unwrap(), "000001.SZ,平安银行,11.5");
        assert_eq!(lines.next().unwrap(), "600000.SH,浦发银行,");
    }

    #[test]
    fn csv_round_trips_through_the_ingest_path() {
        let table = sample_table();
        let text = table_to_csv(&table).unwrap();

        let grid = parse_csv_text(&text).unwrap();
        let header = normalize_headers(&grid);
        let reread = clean_table(raw_table(header.columns, header.data_rows));

        assert_eq!(reread.row_count(), table.row_count());
        let values = |t: &EntityTable| -> Vec<String> {
            let mut v: Vec<String> = t
                .rows
                .iter()
                .flatten()
                .filter(|c| !c.is_null())
                .map(Cell::to_field)
                .collect();
            v.sort();
            v
        };
        assert_eq!(values(&reread), values(&table));
    }

    #[test]
    fn xlsx_binary_is_produced() {
        let bytes = table_to_xlsx(&sample_table()).unwrap();
        // xlsx is a zip container; check the magic.
        assert_eq!(&bytes[..2], b"PK");
    }
}
