// src/snapshot/history.rs

use super::Snapshot;

/// Append-only, time-ordered collection of processed snapshots, owned by
/// the monitoring controller and passed by reference into each pipeline
/// run. Entries are never mutated or removed here; retention is the
/// controller's concern.
#[derive(Debug, Default)]
pub struct MonitoringHistory {
    snapshots: Vec<Snapshot>,
}

impl MonitoringHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent snapshot, if any run has completed.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Append one completed snapshot and return a borrow of it.
    pub fn append(&mut self, snapshot: Snapshot) -> &Snapshot {
        self.snapshots.push(snapshot);
        // Just pushed, so the borrow is always available.
        &self.snapshots[self.snapshots.len() - 1]
    }

    pub fn count(&self) -> usize {
        self.snapshots.len()
    }

    /// Snapshots oldest-first, read-only.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::{BTreeMap, BTreeSet};

    use crate::table::EntityTable;

    fn empty_snapshot() -> Snapshot {
        Snapshot {
            timestamp: Utc::now(),
            entity_count: 0,
            table: EntityTable::new(Vec::new(), Vec::new()),
            slopes: BTreeMap::new(),
            series: BTreeMap::new(),
            names: BTreeMap::new(),
            newly_appeared: BTreeSet::new(),
            degraded_keys: false,
        }
    }

    #[test]
    fn append_only_ordering() {
        let mut history = MonitoringHistory::new();
        assert!(history.latest().is_none());
        assert_eq!(history.count(), 0);

        let first = empty_snapshot();
        let first_ts = first.timestamp;
        history.append(first);
        let second = empty_snapshot();
        history.append(second);

        assert_eq!(history.count(), 2);
        let collected: Vec<_> = history.iter().map(|s| s.timestamp).collect();
        assert_eq!(collected[0], first_ts);
        assert_eq!(history.latest().map(|s| s.timestamp), Some(collected[1]));
    }
}
