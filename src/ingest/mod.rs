// src/ingest/mod.rs

pub mod encoding;
mod excel;

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use tracing::{debug, warn};

/// Untyped 2-D grid exactly as read from the source file, before any
/// header interpretation. Width is the widest row; shorter rows read as
/// padded with empty cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGrid {
    pub rows: Vec<Vec<String>>,
    pub width: usize,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self { rows, width }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }
}

/// Read one snapshot file into a RawGrid, choosing the reader from the
/// extension hint: `csv` → CSV, `xls`/`xlsx` → spreadsheet. Anything else
/// falls back to auto-detection: spreadsheet first, then CSV.
pub fn read_raw_grid(path: &Path) -> Result<RawGrid> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "csv" => read_csv_grid(path),
        "xls" | "xlsx" => excel::read_excel_grid(path),
        _ => auto_detect_grid(path),
    }
}

/// Read a CSV file through the encoding fallback chain into a RawGrid.
/// No header interpretation happens here; rows come back verbatim.
pub fn read_csv_grid(path: &Path) -> Result<RawGrid> {
    let bytes =
        fs::read(path).with_context(|| format!("reading csv file {}", path.display()))?;
    let text = encoding::decode_text(&bytes)
        .with_context(|| format!("decoding csv file {}", path.display()))?;
    parse_csv_text(&text)
}

/// Parse already-decoded CSV text into a RawGrid.
pub fn parse_csv_text(text: &str) -> Result<RawGrid> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(text.as_bytes()));

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("csv parse error at record {}", idx))?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }
    Ok(RawGrid::new(rows))
}

/// Try each typed reader in turn when the extension tells us nothing.
fn auto_detect_grid(path: &Path) -> Result<RawGrid> {
    match excel::read_excel_grid(path) {
        Ok(grid) if !grid.is_empty() => return Ok(grid),
        Ok(_) => debug!("auto-detect: spreadsheet reader produced an empty grid"),
        Err(e) => debug!("auto-detect: spreadsheet reader failed: {e:#}"),
    }
    read_csv_grid(path)
        .with_context(|| format!("auto-detect failed for {}", path.display()))
}

/// Newest regular file in `dir` by modified time, for callers that hand
/// the pipeline a download directory instead of a single file.
pub fn latest_file_in(dir: &Path) -> Result<Option<PathBuf>> {
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in
        fs::read_dir(dir).with_context(|| format!("listing directory {}", dir.display()))?
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("skipping unreadable directory entry: {e}");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let modified = entry.metadata().and_then(|m| m.modified());
        let modified = match modified {
            Ok(m) => m,
            Err(e) => {
                warn!("no modified time for {}: {e}", path.display());
                continue;
            }
        };
        if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
            newest = Some((modified, path));
        }
    }
    Ok(newest.map(|(_, p)| p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn csv_text_parses_into_ragged_grid() {
        let grid = parse_csv_text("代码,名称,收盘价\n000001,平安银行,11.5,extra\n").unwrap();
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.width, 4);
        assert_eq!(grid.rows[1][1], "平安银行");
    }

    #[test]
    fn gbk_csv_round_trips_through_file_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        let (gbk, _, _) = encoding_rs::GBK.encode("代码,名称\n000001,平安银行\n");
        fs::File::create(&path)
            .unwrap()
            .write_all(&gbk)
            .unwrap();

        let grid = read_raw_grid(&path).unwrap();
        assert_eq!(grid.rows[0], vec!["代码", "名称"]);
        assert_eq!(grid.rows[1], vec!["000001", "平安银行"]);
    }

    #[test]
    fn unknown_extension_falls_back_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.dat");
        fs::write(&path, "code,name\n1,a\n").unwrap();
        let grid = read_raw_grid(&path).unwrap();
        assert_eq!(grid.rows.len(), 2);
    }

    #[test]
    fn latest_file_picks_newest() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.csv");
        let new = dir.path().join("new.csv");
        fs::write(&old, "a\n").unwrap();
        fs::write(&new, "b\n").unwrap();
        // Make the ordering unambiguous regardless of filesystem timestamp
        // granularity.
        let past = std::time::SystemTime::now() - std::time::Duration::from_secs(60);
        let f = fs::File::open(&old).unwrap();
        f.set_modified(past).unwrap();

        let picked = latest_file_in(dir.path()).unwrap().unwrap();
        assert_eq!(picked, new);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_raw_grid(Path::new("/no/such/file.csv")).is_err());
    }
}
