// src/pipeline.rs
//
// One pipeline invocation: raw file → normalized header → cleaned table
// → trends + diff → one immutable Snapshot. A run either completes and
// appends exactly one snapshot, or fails and appends nothing.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::clean::{clean_table, raw_table};
use crate::ingest::read_raw_grid;
use crate::normalize::normalize_headers;
use crate::snapshot::history::MonitoringHistory;
use crate::snapshot::{entity_key_set, newly_appeared, Snapshot};
use crate::trend::compute_trends;

/// Process one snapshot file against the previous snapshot (if any).
///
/// Unreadable sources — missing file, undecodable bytes, a table that is
/// empty once cleaned — are recoverable errors: the caller gets `Err`
/// and no snapshot exists for this run. Partial inference failures
/// (ambiguous header, unparseable dates, unresolved identifier columns)
/// degrade inside the stages and still produce a snapshot.
#[instrument(level = "info", skip(path, previous), fields(path = %path.display()))]
pub fn process_file(path: &Path, previous: Option<&Snapshot>) -> Result<Snapshot> {
    let grid = read_raw_grid(path)
        .with_context(|| format!("reading snapshot source {}", path.display()))?;
    if grid.is_empty() {
        bail!("{} contained no tabular data", path.display());
    }

    let header = normalize_headers(&grid);
    let table = clean_table(raw_table(header.columns, header.data_rows));
    if table.is_empty() {
        bail!("{} was empty after cleaning", path.display());
    }

    let trends = compute_trends(&table);

    let mut slopes = BTreeMap::new();
    let mut series = BTreeMap::new();
    let mut names = BTreeMap::new();
    for trend in trends {
        slopes.insert(trend.key.clone(), trend.slope_pct);
        series.insert(trend.key.clone(), trend.series);
        names.insert(trend.key, trend.name);
    }

    let (current_keys, degraded_keys) = entity_key_set(&table);
    if degraded_keys {
        warn!("positional fallback identifiers in use; diff quality degraded");
    }
    let newly_appeared = newly_appeared(&current_keys, previous);

    let snapshot = Snapshot {
        timestamp: Utc::now(),
        entity_count: table.row_count(),
        table,
        slopes,
        series,
        names,
        newly_appeared,
        degraded_keys,
    };
    info!(
        entities = snapshot.entity_count,
        newly_appeared = snapshot.newly_appeared.len(),
        "snapshot processed"
    );
    Ok(snapshot)
}

/// Read latest → process → append, the unit the caller must serialize.
/// Returns a borrow of the appended snapshot.
pub fn run<'a>(path: &Path, history: &'a mut MonitoringHistory) -> Result<&'a Snapshot> {
    let snapshot = process_file(path, history.latest())?;
    Ok(history.append(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const FIRST: &str = "\
股票代码,股票名称,收盘价,undefined,undefined
,,2025.11.12,2025.11.13,2025.11.14
000001.SZ,平安银行,10.0,10.5,11.0
600000.SH,浦发银行,8.0,8.1,8.2
";

    const SECOND: &str = "\
股票代码,股票名称,收盘价,undefined,undefined
,,2025.11.13,2025.11.14,2025.11.17
000001.SZ,平安银行,10.5,11.0,11.5
300750.SZ,宁德时代,200.0,210.0,220.0
";

    fn write_csv(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn end_to_end_run_builds_a_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "first.csv", FIRST);
        let mut history = MonitoringHistory::new();

        let snapshot = run(&path, &mut history).unwrap();
        assert_eq!(snapshot.entity_count, 2);
        assert!(!snapshot.degraded_keys);
        // First run: everything is new.
        assert_eq!(snapshot.newly_appeared.len(), 2);
        // Rising prices for both entities.
        assert!(snapshot.slopes["000001.SZ 平安银行"] > 0.0);
        assert!(snapshot.slopes["600000.SH 浦发银行"] > 0.0);
        assert_eq!(
            snapshot.series["000001.SZ 平安银行"].prices,
            vec![10.0, 10.5, 11.0]
        );
        assert_eq!(history.count(), 1);
    }

    #[test]
    fn second_run_diffs_against_the_first() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_csv(&dir, "first.csv", FIRST);
        let second = write_csv(&dir, "second.csv", SECOND);
        let mut history = MonitoringHistory::new();

        run(&first, &mut history).unwrap();
        let snapshot = run(&second, &mut history).unwrap();

        assert_eq!(snapshot.newly_appeared.len(), 1);
        assert!(snapshot.newly_appeared.contains("300750.SZ 宁德时代"));
        assert_eq!(history.count(), 2);
    }

    #[test]
    fn unreadable_source_appends_nothing() {
        let mut history = MonitoringHistory::new();
        let missing = Path::new("/no/such/dir/export.csv");
        assert!(run(missing, &mut history).is_err());
        assert_eq!(history.count(), 0);
    }

    #[test]
    fn empty_after_cleaning_appends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "empty.csv", "代码,名称\n-,—\n--,空值\n");
        let mut history = MonitoringHistory::new();
        assert!(run(&path, &mut history).is_err());
        assert_eq!(history.count(), 0);
    }
}
