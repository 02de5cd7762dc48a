use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use log::{debug, info};

use super::error::LoadError;
use super::loader::{load_snapshot, tabular_delimiter};
use super::model::Snapshot;
use super::resolve::{nfc, sorted_entries};
use crate::config::DashboardConfig;

// ---------------------------------------------------------------------------
// Fingerprint – (path, modification time, length) of every input file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStamp {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

/// The state of every file the loaders would read, in path order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(Vec<FileStamp>);

impl Fingerprint {
    pub fn of(config: &DashboardConfig) -> io::Result<Self> {
        let growth_name = nfc(&config.growth_file);
        let mut stamps = Vec::new();
        for path in sorted_entries(&config.data_dir)? {
            let is_growth = path
                .file_name()
                .is_some_and(|n| nfc(&n.to_string_lossy()) == growth_name);
            if !is_growth && tabular_delimiter(&path).is_none() {
                continue;
            }
            // Entries the loaders skip (dangling links, directories, files
            // removed since the listing) do not take part in the fingerprint.
            let Some(meta) = std::fs::metadata(&path).ok().filter(|m| m.is_file()) else {
                continue;
            };
            stamps.push(FileStamp {
                modified: meta.modified().ok(),
                len: meta.len(),
                path,
            });
        }
        Ok(Fingerprint(stamps))
    }
}

// ---------------------------------------------------------------------------
// SnapshotCache – explicit memoization of the loaded data
// ---------------------------------------------------------------------------

/// Holds the last successfully loaded snapshot together with the fingerprint
/// of the files it came from.
///
/// Snapshots are handed out as `Arc`s and never mutated, so a caller may keep
/// using an old one while a reload builds its replacement.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    cached: Option<(Fingerprint, Arc<Snapshot>)>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached snapshot if no input file changed, otherwise load a
    /// fresh one. Failed loads leave the cache untouched.
    pub fn load(&mut self, config: &DashboardConfig) -> Result<Arc<Snapshot>, LoadError> {
        let fingerprint =
            Fingerprint::of(config).map_err(|e| LoadError::io(&config.data_dir, e))?;

        if let Some((cached_fp, snapshot)) = &self.cached {
            if *cached_fp == fingerprint {
                debug!("Input files unchanged; reusing cached snapshot");
                return Ok(Arc::clone(snapshot));
            }
        }

        let snapshot = Arc::new(load_snapshot(config)?);
        info!("Snapshot (re)loaded from {}", config.data_dir.display());
        self.cached = Some((fingerprint, Arc::clone(&snapshot)));
        Ok(snapshot)
    }

    /// Drop the cached snapshot; the next [`load`](Self::load) reads from disk.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.cached.as_ref().map(|(_, s)| Arc::clone(s))
    }
}
