use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::demo::demo_snapshot;
use super::parse::parse_snapshot;
use super::snapshot::{SNAPSHOT_CEILING, Snapshot};

/// Where the host gets its snapshot from.
#[derive(Clone, Debug, PartialEq)]
pub enum SnapshotSource {
    Capture(PathBuf),
    Demo { seed: u64, columns: i32, rows: i32 },
}

impl SnapshotSource {
    pub fn describe(&self) -> String {
        match self {
            Self::Capture(path) => path.display().to_string(),
            Self::Demo {
                seed,
                columns,
                rows,
            } => format!("demo atlas {columns}x{rows} (seed {seed})"),
        }
    }

    pub fn load(&self) -> Result<Snapshot> {
        match self {
            Self::Capture(path) => load_snapshot(path),
            Self::Demo {
                seed,
                columns,
                rows,
            } => {
                let snapshot = demo_snapshot(*seed, *columns, *rows);
                info!(
                    nodes = snapshot.node_count(),
                    connections = snapshot.connection_count(),
                    source = %self.describe(),
                    "generated snapshot"
                );
                Ok(snapshot)
            }
        }
    }
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot capture {}", path.display()))?;
    let (snapshot, report) = parse_snapshot(&raw)
        .with_context(|| format!("failed to parse snapshot capture {}", path.display()))?;

    if report.truncated {
        warn!(
            path = %path.display(),
            ceiling = SNAPSHOT_CEILING,
            "record list exceeds sanity ceiling, ignoring it"
        );
    }
    if report.skipped_nodes > 0 || report.skipped_connections > 0 {
        debug!(
            skipped_nodes = report.skipped_nodes,
            skipped_connections = report.skipped_connections,
            "dropped malformed records"
        );
    }

    info!(
        nodes = snapshot.node_count(),
        connections = snapshot.connection_count(),
        source = %path.display(),
        "loaded snapshot"
    );
    Ok(snapshot)
}
