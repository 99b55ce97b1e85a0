use std::env;
use std::path::Path;

use anyhow::{anyhow, bail, Result};
use serde::Serialize;
use stockmon::{ingest, pipeline, MonitoringHistory, Snapshot};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Machine-readable per-run summary printed to stdout, one line per
/// processed snapshot.
#[derive(Serialize)]
struct RunSummary<'a> {
    source: &'a str,
    entity_count: usize,
    newly_appeared: Vec<&'a str>,
    degraded_keys: bool,
    top_slopes: Vec<(&'a str, f64)>,
}

fn summarize<'a>(source: &'a str, snapshot: &'a Snapshot) -> RunSummary<'a> {
    let mut ranked: Vec<(&str, f64)> = snapshot
        .slopes
        .iter()
        .map(|(k, v)| (k.as_str(), *v))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(5);

    RunSummary {
        source,
        entity_count: snapshot.entity_count,
        newly_appeared: snapshot
            .newly_appeared
            .iter()
            .map(String::as_str)
            .collect(),
        degraded_keys: snapshot.degraded_keys,
        top_slopes: ranked,
    }
}

fn resolve_source(path: &Path) -> Result<std::path::PathBuf> {
    if path.is_dir() {
        ingest::latest_file_in(path)?
            .ok_or_else(|| anyhow!("{} contains no files", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env_filter).init();
    info!("startup");

    // ─── 2) collect snapshot files from the command line ─────────────
    let files: Vec<String> = env::args().skip(1).collect();
    if files.is_empty() {
        bail!("usage: stockmon <export-file> [<export-file> ...]");
    }

    // ─── 3) process each source as one monitoring cycle ──────────────
    // A directory argument stands in for the browser download folder:
    // its newest file is the snapshot for that cycle.
    let mut history = MonitoringHistory::new();
    for file in &files {
        let source = match resolve_source(Path::new(file)) {
            Ok(p) => p,
            Err(err) => {
                error!("{} failed: {:#}", file, err);
                continue;
            }
        };
        match pipeline::run(&source, &mut history) {
            Ok(snapshot) => {
                info!(
                    source = %file,
                    entities = snapshot.entity_count,
                    newly_appeared = snapshot.newly_appeared.len(),
                    "cycle complete"
                );
                println!("{}", serde_json::to_string(&summarize(file, snapshot))?);
            }
            Err(err) => {
                // Recoverable: this cycle produced no snapshot, move on.
                error!("{} failed: {:#}", file, err);
            }
        }
    }

    info!("processed {} of {} snapshot files", history.count(), files.len());
    Ok(())
}
