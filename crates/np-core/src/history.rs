//! History stores for persisted snapshots.
//!
//! The core consumes a `SnapshotStore` for two things: best-effort
//! persistence of every snapshot it hands out, and time-range queries that
//! feed training. Store failures are logged by callers and never take the
//! pipeline down — the core keeps operating on in-memory state.

use chrono::{DateTime, Utc};
use np_common::{Error, MetricsSnapshot, Result, SnapshotId};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// A snapshot with its storage-assigned identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub id: SnapshotId,
    pub snapshot: MetricsSnapshot,
}

/// Storage for metrics snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Persist one snapshot, returning its storage-assigned id.
    fn persist(&self, snapshot: &MetricsSnapshot) -> Result<SnapshotId>;

    /// Snapshots with `start <= timestamp <= end`, ascending by timestamp.
    fn query(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<MetricsSnapshot>>;
}

/// In-memory store for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<StoredSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted snapshots.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotStore for MemoryStore {
    fn persist(&self, snapshot: &MetricsSnapshot) -> Result<SnapshotId> {
        let id = SnapshotId::new();
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(StoredSnapshot {
                id,
                snapshot: snapshot.clone(),
            });
        Ok(id)
    }

    fn query(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<MetricsSnapshot>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut hits: Vec<MetricsSnapshot> = entries
            .iter()
            .filter(|e| e.snapshot.timestamp >= start && e.snapshot.timestamp <= end)
            .map(|e| e.snapshot.clone())
            .collect();
        hits.sort_by_key(|s| s.timestamp);
        Ok(hits)
    }
}

/// Append-only JSONL file store.
///
/// One `StoredSnapshot` per line. Queries scan the whole file; corrupt
/// lines are skipped with a warning rather than failing the query, so one
/// torn write cannot poison the history.
#[derive(Debug)]
pub struct JsonlStore {
    path: PathBuf,
    // Serializes appends from concurrent callers.
    write_lock: Mutex<()>,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonlStore {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SnapshotStore for JsonlStore {
    fn persist(&self, snapshot: &MetricsSnapshot) -> Result<SnapshotId> {
        let id = SnapshotId::new();
        let line = serde_json::to_string(&StoredSnapshot {
            id,
            snapshot: snapshot.clone(),
        })?;

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(id)
    }

    fn query(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<MetricsSnapshot>> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            // No writes yet: an empty history, not an error.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Error::Io(err)),
        };

        let mut hits = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredSnapshot>(&line) {
                Ok(entry) => {
                    if entry.snapshot.timestamp >= start && entry.snapshot.timestamp <= end {
                        hits.push(entry.snapshot);
                    }
                }
                Err(err) => {
                    warn!(
                        path = %self.path.display(),
                        line = lineno + 1,
                        error = %err,
                        "skipping corrupt history line"
                    );
                }
            }
        }
        hits.sort_by_key(|s| s.timestamp);
        Ok(hits)
    }
}
