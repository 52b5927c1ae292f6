//! Non-recursive directory tree walker.
//!
//! Pending directories live on an explicit frontier stack, so tree depth is
//! bounded by heap, not by the call stack. Every failure below the root is
//! recorded as an [`EntryError`] and the walk moves on to the next entry.

use crate::error::{EntryError, EntryStage};
use crate::exclusion::ExclusionSet;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

/// A candidate produced by the walker: a UTF-8 path plus its stat metadata.
#[derive(Debug)]
pub struct WalkEntry {
    pub path: PathBuf,
    /// `path` as the catalog key
    pub key: String,
    pub metadata: Metadata,
}

/// Receives every accepted entry. Returning `Err` aborts the walk.
pub trait Visitor {
    fn visit(&mut self, entry: &WalkEntry) -> crate::Result<()>;
}

impl<F> Visitor for F
where
    F: FnMut(&WalkEntry) -> crate::Result<()>,
{
    fn visit(&mut self, entry: &WalkEntry) -> crate::Result<()> {
        self(entry)
    }
}

/// Outcome of one walk
#[derive(Debug, Default)]
pub struct WalkSummary {
    pub directories_read: usize,
    pub entries_seen: usize,
    pub entries_excluded: usize,
    /// Whether the root directory itself could be opened
    pub root_readable: bool,
    pub errors: Vec<EntryError>,
}

pub struct TreeWalker {
    exclusions: ExclusionSet,
}

impl TreeWalker {
    pub fn new(exclusions: ExclusionSet) -> Self {
        Self { exclusions }
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Visit every non-excluded descendant of `root` exactly once.
    ///
    /// The root itself is not visited. Order is unspecified.
    pub fn walk<V: Visitor>(&self, root: &Path, visitor: &mut V) -> crate::Result<WalkSummary> {
        let mut summary = WalkSummary::default();
        let mut frontier: Vec<PathBuf> = vec![root.to_path_buf()];
        let mut at_root = true;

        while let Some(dir) = frontier.pop() {
            let is_root = std::mem::take(&mut at_root);

            let read_dir = match fs::read_dir(&dir) {
                Ok(rd) => rd,
                Err(e) => {
                    summary
                        .errors
                        .push(EntryError::new(&dir, EntryStage::OpenDir, e));
                    continue;
                }
            };
            if is_root {
                summary.root_readable = true;
            }
            summary.directories_read += 1;

            // read_dir never yields "." or ".."
            for child in read_dir {
                let child = match child {
                    Ok(c) => c,
                    Err(e) => {
                        summary
                            .errors
                            .push(EntryError::new(&dir, EntryStage::ReadEntry, e));
                        continue;
                    }
                };

                let path = child.path();
                let Some(key) = path.to_str().map(str::to_owned) else {
                    summary.errors.push(EntryError::new(
                        &path,
                        EntryStage::NonUtf8,
                        "path is not valid UTF-8",
                    ));
                    continue;
                };

                if self.exclusions.is_excluded(&key) {
                    tracing::trace!(path = %key, "excluded");
                    summary.entries_excluded += 1;
                    continue;
                }

                let metadata = match fs::metadata(&path) {
                    Ok(m) => m,
                    Err(e) => {
                        summary
                            .errors
                            .push(EntryError::new(&path, EntryStage::Stat, e));
                        continue;
                    }
                };

                // Links are recorded with their target's metadata but never
                // expanded, so a link cycle cannot loop the walk.
                let descend = metadata.is_dir()
                    && !child.file_type().map(|t| t.is_symlink()).unwrap_or(false);

                summary.entries_seen += 1;
                let entry = WalkEntry {
                    path,
                    key,
                    metadata,
                };
                visitor.visit(&entry)?;

                if descend {
                    frontier.push(entry.path);
                }
            }
        }

        Ok(summary)
    }
}
