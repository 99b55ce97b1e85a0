// src/snapshot/mod.rs

pub mod history;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::clean::resolve;
use crate::table::EntityTable;
use crate::trend::PriceSeries;

/// One fully processed pipeline run. Created once, never mutated;
/// consumers borrow its fields read-only.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub entity_count: usize,
    pub table: EntityTable,
    pub slopes: BTreeMap<String, f64>,
    pub series: BTreeMap<String, PriceSeries>,
    pub names: BTreeMap<String, String>,
    pub newly_appeared: BTreeSet<String>,
    /// Set when any row fell back to a positional identifier. Fallback
    /// keys are not stable across runs, so `newly_appeared` should not
    /// be trusted for this snapshot.
    pub degraded_keys: bool,
}

impl Snapshot {
    /// Entity keys for every row of this snapshot's table.
    pub fn entity_keys(&self) -> BTreeSet<String> {
        entity_key_set(&self.table).0
    }
}

/// Keys for every table row, plus whether any row needed a positional
/// fallback.
pub fn entity_key_set(table: &EntityTable) -> (BTreeSet<String>, bool) {
    let mut keys = BTreeSet::new();
    let mut degraded = false;
    for row in 0..table.row_count() {
        let (key, row_degraded) = resolve::entity_key(table, row);
        degraded |= row_degraded;
        keys.insert(key);
    }
    (keys, degraded)
}

/// Keys present now but absent from the previous snapshot. With no
/// previous snapshot every current key is newly appeared (first-run
/// semantics, not an error).
pub fn newly_appeared(
    current: &BTreeSet<String>,
    previous: Option<&Snapshot>,
) -> BTreeSet<String> {
    let fresh = match previous {
        Some(prev) => {
            let prev_keys = prev.entity_keys();
            current.difference(&prev_keys).cloned().collect()
        }
        None => current.clone(),
    };
    debug!(
        current = current.len(),
        newly_appeared = fresh.len(),
        first_run = previous.is_none(),
        "diffed entity keys"
    );
    fresh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn table(keys: &[(&str, &str)]) -> EntityTable {
        EntityTable::new(
            vec!["股票代码".into(), "股票名称".into()],
            keys.iter()
                .map(|(code, name)| {
                    vec![
                        Cell::Text(code.to_string()),
                        Cell::Text(name.to_string()),
                    ]
                })
                .collect(),
        )
    }

    fn snapshot(t: EntityTable) -> Snapshot {
        let (keys, degraded) = entity_key_set(&t);
        let newly = newly_appeared(&keys, None);
        Snapshot {
            timestamp: Utc::now(),
            entity_count: t.row_count(),
            table: t,
            slopes: BTreeMap::new(),
            series: BTreeMap::new(),
            names: BTreeMap::new(),
            newly_appeared: newly,
            degraded_keys: degraded,
        }
    }

    #[test]
    fn first_run_marks_every_key_new() {
        let t = table(&[("000001", "平安银行"), ("600000", "浦发银行")]);
        let (keys, degraded) = entity_key_set(&t);
        assert!(!degraded);
        let fresh = newly_appeared(&keys, None);
        assert_eq!(fresh, keys);
    }

    #[test]
    fn diff_contains_only_added_keys() {
        let prev = snapshot(table(&[("000001", "平安银行"), ("600000", "浦发银行")]));
        let current = table(&[("000001", "平安银行"), ("300750", "宁德时代")]);
        let (keys, _) = entity_key_set(&current);
        let fresh = newly_appeared(&keys, Some(&prev));
        assert_eq!(fresh.len(), 1);
        assert!(fresh.contains("300750 宁德时代"));
        assert!(!fresh.contains("000001 平安银行"));
        assert!(!fresh.contains("600000 浦发银行"));
    }

    #[test]
    fn fallback_rows_degrade_the_key_set() {
        let t = EntityTable::new(
            vec!["收盘价_2025.11.12".into()],
            vec![vec![Cell::Number(10.0)]],
        );
        let (keys, degraded) = entity_key_set(&t);
        assert!(degraded);
        assert!(keys.contains("代码0 股票0"));
    }
}
