//! Memoized event-table cache keyed by file identity.
//!
//! Wraps [`load_event_table`] with a fingerprint-validated memoization cache:
//! path -> (fingerprint, table). [`TableCache::get_or_load`] revalidates the
//! (size, mtime) fingerprint and reloads when the file changed on disk.
//! Cached tables are handed out as [`Arc`] so concurrent read-only consumers
//! share one immutable copy.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use orderlens_core::error::{LensError, Result};
use orderlens_core::markers::MarkerRules;
use orderlens_core::models::{EventTable, LoadStats};
use tracing::debug;

use crate::reader::{load_event_table, LoaderConfig};

// ── FileFingerprint ───────────────────────────────────────────────────────────

/// Identity of a file's on-disk content: byte length plus modification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

impl FileFingerprint {
    /// Probe the current fingerprint of `path`.
    pub fn probe(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path).map_err(|source| LensError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

// ── TableCache ────────────────────────────────────────────────────────────────

struct CacheEntry {
    fingerprint: FileFingerprint,
    table: Arc<EventTable>,
    stats: LoadStats,
}

/// Fingerprint-validated memoization of normalized event tables.
///
/// One cache instance serves any number of input paths; loader configuration
/// and marker rules are fixed at construction since they are part of what a
/// cached table means.
pub struct TableCache {
    config: LoaderConfig,
    rules: MarkerRules,
    entries: HashMap<PathBuf, CacheEntry>,
}

impl TableCache {
    /// Create an empty cache for the given loader configuration and rules.
    pub fn new(config: LoaderConfig, rules: MarkerRules) -> Self {
        Self {
            config,
            rules,
            entries: HashMap::new(),
        }
    }

    /// Return the table for `path`, loading it only when no entry exists or
    /// the file's fingerprint changed since the entry was made.
    ///
    /// Load failures are returned as-is and never cached, so a later call
    /// retries the read.
    pub fn get_or_load(&mut self, path: &Path) -> Result<(Arc<EventTable>, LoadStats)> {
        let fingerprint = FileFingerprint::probe(path)?;

        if let Some(entry) = self.entries.get(path) {
            if entry.fingerprint == fingerprint {
                debug!("Cache hit for {}", path.display());
                return Ok((Arc::clone(&entry.table), entry.stats.clone()));
            }
            debug!("Fingerprint changed for {}, reloading", path.display());
        }

        let (table, stats) = load_event_table(path, &self.config, &self.rules)?;
        let table = Arc::new(table);
        self.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                fingerprint,
                table: Arc::clone(&table),
                stats: stats.clone(),
            },
        );
        Ok((table, stats))
    }

    /// Drop the entry for `path`, forcing the next call to reload it.
    pub fn invalidate(&mut self, path: &Path) {
        self.entries.remove(path);
    }

    /// Drop every cached entry.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache currently holds no tables.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
