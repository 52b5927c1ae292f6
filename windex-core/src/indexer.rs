//! Incremental indexing: walk, reconcile against stored mtimes, prune.
//!
//! One run is one catalog transaction. Inserts, updates and pruning deletes
//! all commit together; an error or interruption before commit leaves the
//! catalog exactly as it was.

use crate::catalog::{Catalog, Records};
use crate::error::{EntryError, EntryStage};
use crate::exclusion::ExclusionSet;
use crate::record::FileRecord;
use crate::walker::{TreeWalker, WalkEntry};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::time::Instant;

/// Statistics from an indexing run
#[derive(Debug, Default, Serialize)]
pub struct IndexStats {
    pub root: PathBuf,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub deleted: usize,
    pub entries_seen: usize,
    pub directories_read: usize,
    pub excluded: usize,
    pub elapsed_ms: u64,
    pub errors: Vec<EntryError>,
}

impl IndexStats {
    /// Rows written by this run (inserts + updates + deletes)
    pub fn writes(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }
}

/// What the reconciler did with one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Insert,
    Update,
    Unchanged,
}

impl Decision {
    /// Compare the stored mtime (if any) with the one observed on disk.
    pub fn for_mtimes(stored: Option<i64>, observed: i64) -> Self {
        match stored {
            None => Self::Insert,
            Some(t) if t == observed => Self::Unchanged,
            Some(_) => Self::Update,
        }
    }
}

/// Applies walk entries to the catalog inside the run's transaction.
pub struct Reconciler<'c> {
    records: Records<'c>,
    stats: IndexStats,
}

impl<'c> Reconciler<'c> {
    pub fn new(records: Records<'c>) -> Self {
        Self {
            records,
            stats: IndexStats::default(),
        }
    }

    /// Insert, update or skip one entry. Statement failures are recorded
    /// and do not stop the run.
    pub fn reconcile(&mut self, entry: &WalkEntry) {
        let record = match FileRecord::from_metadata(&entry.key, &entry.metadata) {
            Ok(r) => r,
            Err(e) => {
                self.stats
                    .errors
                    .push(EntryError::new(&entry.path, EntryStage::Stat, e));
                return;
            }
        };

        let stored = match self.records.lookup_modified_at(&record.path) {
            Ok(t) => t,
            Err(e) => {
                self.stats
                    .errors
                    .push(EntryError::new(&entry.path, EntryStage::Lookup, e));
                return;
            }
        };

        let decision = Decision::for_mtimes(stored, record.modified_at);
        if decision == Decision::Unchanged {
            self.stats.unchanged += 1;
            return;
        }

        match self.records.upsert(&record) {
            Ok(true) => {
                tracing::debug!(path = %record.path, ?decision, "catalog write");
                match decision {
                    Decision::Insert => self.stats.inserted += 1,
                    _ => self.stats.updated += 1,
                }
            }
            Ok(false) => self.stats.unchanged += 1,
            Err(e) => self
                .stats
                .errors
                .push(EntryError::new(&entry.path, EntryStage::Write, e)),
        }
    }

    /// Delete rows under `root` whose path is gone or now excluded.
    ///
    /// A row is deleted only when stat reports the path as missing
    /// (`NotFound`, or `NotADirectory` for a parent that became a file).
    /// Other stat failures keep the row and are recorded.
    pub fn prune(&mut self, root: &Path, exclusions: &ExclusionSet) -> crate::Result<()> {
        let prefix = root_prefix(root)?;
        let candidates = self.records.find_by_path_prefix(&prefix)?;
        tracing::debug!(prefix = %prefix, candidates = candidates.len(), "pruning");

        for path in candidates {
            let gone = if exclusions.is_excluded(&path) {
                true
            } else {
                match fs::metadata(&path) {
                    Ok(_) => false,
                    Err(e) if is_missing(&e) => true,
                    Err(e) => {
                        self.stats
                            .errors
                            .push(EntryError::new(&path, EntryStage::PruneStat, e));
                        false
                    }
                }
            };
            if !gone {
                continue;
            }

            match self.records.delete_by_path(&path) {
                Ok(true) => {
                    tracing::debug!(path = %path, "pruned");
                    self.stats.deleted += 1;
                }
                Ok(false) => {}
                Err(e) => self
                    .stats
                    .errors
                    .push(EntryError::new(&path, EntryStage::PruneDelete, e)),
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    pub fn into_stats(self) -> IndexStats {
        self.stats
    }
}

/// Walks a root and reconciles it into a catalog, one transaction per run.
pub struct Indexer {
    walker: TreeWalker,
}

impl Indexer {
    pub fn new(exclusions: ExclusionSet) -> Self {
        Self {
            walker: TreeWalker::new(exclusions),
        }
    }

    /// Index `root` into `catalog`
    pub fn index(&self, catalog: &mut Catalog, root: &Path) -> crate::Result<IndexStats> {
        self.index_with(catalog, root, |_| Ok(()))
    }

    /// Index `root`, calling `on_entry` after each entry is reconciled.
    ///
    /// `root` is made absolute against the working directory first, so
    /// catalog keys never depend on where the run was started. An `Err`
    /// from `on_entry` aborts the run; nothing from it is committed.
    pub fn index_with<F>(
        &self,
        catalog: &mut Catalog,
        root: &Path,
        mut on_entry: F,
    ) -> crate::Result<IndexStats>
    where
        F: FnMut(&WalkEntry) -> crate::Result<()>,
    {
        let started = Instant::now();
        // Not canonicalize: a missing root must stay a recoverable error
        let root = std::path::absolute(root)?;
        let root = root.as_path();
        tracing::info!(root = %root.display(), "indexing started");

        let tx = catalog.transaction()?;
        let mut reconciler = Reconciler::new(tx.records());

        let walk = self.walker.walk(root, &mut |entry: &WalkEntry| {
            reconciler.reconcile(entry);
            on_entry(entry)
        })?;

        if walk.root_readable {
            reconciler.prune(root, self.walker.exclusions())?;
        } else {
            tracing::warn!(
                root = %root.display(),
                "root could not be read; skipping prune so existing entries are kept"
            );
        }

        let mut stats = reconciler.into_stats();
        tx.commit()?;

        stats.root = root.to_path_buf();
        stats.entries_seen = walk.entries_seen;
        stats.directories_read = walk.directories_read;
        stats.excluded = walk.entries_excluded;
        let mut errors = walk.errors;
        errors.append(&mut stats.errors);
        stats.errors = errors;
        stats.elapsed_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            inserted = stats.inserted,
            updated = stats.updated,
            unchanged = stats.unchanged,
            deleted = stats.deleted,
            errors = stats.errors.len(),
            elapsed_ms = stats.elapsed_ms,
            "indexing finished"
        );
        Ok(stats)
    }
}

/// Catalog-key prefix for everything strictly below `root`.
fn root_prefix(root: &Path) -> crate::Result<String> {
    let mut prefix = root
        .to_str()
        .ok_or_else(|| crate::WindexError::NonUtf8Path(root.to_path_buf()))?
        .to_string();
    if !prefix.ends_with(MAIN_SEPARATOR) && !prefix.ends_with('/') {
        prefix.push(MAIN_SEPARATOR);
    }
    Ok(prefix)
}

fn is_missing(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}
