// src/lib.rs
//
// stockmon: header normalization & trend pipeline for periodically
// exported stock screener snapshots. Raw CSV/spreadsheet grids come in;
// one immutable Snapshot per run comes out, carrying the cleaned entity
// table, per-entity regression slopes, trading-day price sequences and
// the set of newly appeared entities.

pub mod clean;
pub mod export;
pub mod ingest;
pub mod normalize;
pub mod pipeline;
pub mod snapshot;
pub mod table;
pub mod trend;

pub use snapshot::history::MonitoringHistory;
pub use snapshot::Snapshot;
